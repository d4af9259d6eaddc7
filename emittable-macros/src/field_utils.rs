use syn::{Field, FieldsNamed, Ident, Token, Type, punctuated::Punctuated};

pub(crate) fn has_field_named(fields_named: &FieldsNamed, name: &Ident) -> bool {
    fields_named
        .named
        .iter()
        .any(|f| f.ident.as_ref().map(|i| i == name).unwrap_or(false))
}

/// 确保具名字段结构体包含所需字段
/// - 已存在同名字段时保持原定义与顺序不变，返回 false；
/// - 缺失时在最前插入新字段，返回 true。
pub(crate) fn ensure_field(fields_named: &mut FieldsNamed, name: &Ident, ty: &Type) -> bool {
    if has_field_named(fields_named, name) {
        return false;
    }

    let field: Field = syn::parse_quote! { #name: #ty };
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();
    new_named.push(field);
    for f in fields_named.named.clone().into_iter() {
        new_named.push(f);
    }
    fields_named.named = new_named;
    true
}
