use crate::derive_utils::apply_derives;
use crate::field_utils::ensure_field;
use proc_macro::TokenStream;
use quote::{ToTokens, format_ident, quote};
use syn::punctuated::Punctuated;
use syn::spanned::Spanned;
use syn::{Attribute, Ident, Item, Result, Token, Type, parse::Parse, parse::ParseStream};

const MACRO_NAME: &str = "event_emittable";

/// #[event_emittable] 宏实现
/// - 注入发射器字段（缺失时）并实现 `::emittable::Emittable`
/// - 同一结构体上叠加的重复标注会被移除，组合多次等价于组合一次；
///   叠加标注的参数必须一致，否则报错
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand_tokens(attr.into(), item.into())
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_tokens(
    attr: proc_macro2::TokenStream,
    item: proc_macro2::TokenStream,
) -> Result<proc_macro2::TokenStream> {
    let cfg: EmittableAttrConfig = syn::parse2(attr)?;
    let input: Item = syn::parse2(item)?;

    let mut st = match input {
        Item::Struct(s) => s,
        other => {
            return Err(syn::Error::new(
                other.span(),
                "#[event_emittable] only on struct",
            ));
        }
    };

    // 仅支持具名字段结构体
    let st_span = st.span();
    let syn::Fields::Named(fields_named) = &mut st.fields else {
        return Err(syn::Error::new(st_span, "only supports named-field struct"));
    };

    // 重复组合：叠加的同名标注不再展开
    for stacked in take_stacked(&mut st.attrs) {
        let other = stacked_config(&stacked)?;
        if other.resolved() != cfg.resolved() {
            return Err(syn::Error::new(
                stacked.span(),
                "conflicting #[event_emittable] attributes on the same struct",
            ));
        }
    }

    let payload = cfg.payload_ty();
    let field = cfg.field_ident();
    let emitter_ty: Type = syn::parse_quote! { ::emittable::EventEmitter<#payload> };

    ensure_field(fields_named, &field, &emitter_ty);

    // 每次实例化都通过 Default 得到独立的发射器
    let required: Vec<syn::Path> = if cfg.derive_default.unwrap_or(true) {
        vec![syn::parse_quote!(Default)]
    } else {
        Vec::new()
    };
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    Ok(quote! {
        #st

        impl #impl_generics ::emittable::Emittable for #ident #ty_generics #where_clause {
            type Payload = #payload;

            fn emitter(&self) -> &::emittable::EventEmitter<#payload> { &self.#field }
        }
    })
}

// 取出叠加的同名标注（按路径最后一段匹配，兼容 `emittable_macros::event_emittable`）
fn take_stacked(attrs: &mut Vec<Attribute>) -> Vec<Attribute> {
    let (stacked, kept): (Vec<_>, Vec<_>) = attrs.drain(..).partition(|attr| {
        attr.path()
            .segments
            .last()
            .map(|seg| seg.ident == MACRO_NAME)
            .unwrap_or(false)
    });
    *attrs = kept;
    stacked
}

fn stacked_config(attr: &Attribute) -> Result<EmittableAttrConfig> {
    match &attr.meta {
        syn::Meta::Path(_) => syn::parse2(proc_macro2::TokenStream::new()),
        syn::Meta::List(_) => attr.parse_args(),
        other => Err(syn::Error::new(
            other.span(),
            "expected #[event_emittable] or #[event_emittable(...)]",
        )),
    }
}

// -------- parsing --------

struct EmittableAttrConfig {
    payload: Option<Type>,
    field: Option<Ident>,
    derive_default: Option<bool>,
}

impl Parse for EmittableAttrConfig {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut cfg = Self {
            payload: None,
            field: None,
            derive_default: None,
        };

        if input.is_empty() {
            return Ok(cfg);
        }

        let elems: Punctuated<EmittableAttrElem, Token![,]> =
            Punctuated::<EmittableAttrElem, Token![,]>::parse_terminated(input)?;

        for elem in elems.into_iter() {
            match elem {
                EmittableAttrElem::Payload(key, ty) => {
                    if cfg.payload.is_some() {
                        return Err(duplicate(&key));
                    }
                    cfg.payload = Some(*ty);
                }
                EmittableAttrElem::Field(key, ident) => {
                    if cfg.field.is_some() {
                        return Err(duplicate(&key));
                    }
                    cfg.field = Some(ident);
                }
                EmittableAttrElem::Default(key, b) => {
                    if cfg.derive_default.is_some() {
                        return Err(duplicate(&key));
                    }
                    cfg.derive_default = Some(b);
                }
            }
        }

        Ok(cfg)
    }
}

impl EmittableAttrConfig {
    fn payload_ty(&self) -> Type {
        self.payload.clone().unwrap_or_else(|| syn::parse_quote! { () })
    }

    fn field_ident(&self) -> Ident {
        self.field.clone().unwrap_or_else(|| format_ident!("emitter"))
    }

    // 补齐默认值后的比较键
    fn resolved(&self) -> (String, String, bool) {
        (
            self.payload_ty().to_token_stream().to_string(),
            self.field_ident().to_string(),
            self.derive_default.unwrap_or(true),
        )
    }
}

fn duplicate(key: &Ident) -> syn::Error {
    syn::Error::new(key.span(), format!("duplicate key '{key}' in attribute"))
}

enum EmittableAttrElem {
    Payload(Ident, Box<Type>),
    Field(Ident, Ident),
    Default(Ident, bool),
}

impl Parse for EmittableAttrElem {
    fn parse(input: ParseStream) -> Result<Self> {
        // `default` 是关键字，需要用 parse_any 读取
        let key: Ident = syn::ext::IdentExt::parse_any(input)?;
        let _eq: Token![=] = input.parse()?;
        if key == "payload" {
            let ty: Type = input.parse()?;
            Ok(EmittableAttrElem::Payload(key, Box::new(ty)))
        } else if key == "field" {
            let ident: Ident = input.parse()?;
            Ok(EmittableAttrElem::Field(key, ident))
        } else if key == "default" {
            let lit: syn::LitBool = input.parse().map_err(|e| {
                syn::Error::new(e.span(), "expected boolean literal for 'default'")
            })?;
            Ok(EmittableAttrElem::Default(key, lit.value()))
        } else {
            Err(syn::Error::new(
                key.span(),
                "unknown key in attribute; expected 'payload', 'field' or 'default'",
            ))
        }
    }
}
