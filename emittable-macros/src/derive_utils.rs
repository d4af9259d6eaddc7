use syn::punctuated::Punctuated;
use syn::{Attribute, Path, Token};

// derive 的去重键：只看路径最后一段，`Default` 与 `std::default::Default` 视为同一项
fn derive_key(p: &Path) -> Option<String> {
    p.segments.last().map(|seg| seg.ident.to_string())
}

/// 把结构体上的所有 `#[derive(...)]` 收拢为一个，并补上缺失的 `required`
/// - 用户已有的派生保持原顺序，缺失项追加在后；
/// - 无法解析的 derive 属性原样保留；
/// - 最终没有任何派生时不生成空的 `#[derive()]`。
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<Path>) {
    let mut others: Vec<Attribute> = Vec::with_capacity(attrs.len());
    let mut derived: Vec<Path> = Vec::new();

    for attr in attrs.drain(..) {
        let parsed = if attr.path().is_ident("derive") {
            attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)
                .ok()
        } else {
            None
        };
        match parsed {
            Some(list) => derived.extend(list),
            None => others.push(attr),
        }
    }

    let mut seen = std::collections::HashSet::new();
    derived.extend(required);
    derived.retain(|p| seen.insert(derive_key(p)));

    if !derived.is_empty() {
        attrs.push(syn::parse_quote!(#[derive(#(#derived),*)]));
    }
    attrs.extend(others);
}
