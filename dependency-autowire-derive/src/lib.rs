//! Derive macro for dependency-autowire
//!
//! `#[derive(Autowire)]` implements `dependency_autowire::Autowire` for a
//! struct, describing its constructor from the struct's fields.
//!
//! # Example
//!
//! ```rust,ignore
//! use dependency_autowire::{Autowire, Container, TypeRegistry};
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {}
//!
//! #[derive(Autowire)]
//! #[autowire(implements = dyn Logger)]
//! struct FileLogger {
//!     #[param(default = String::from("app.log"))]
//!     path: String,
//! }
//!
//! impl Logger for FileLogger {}
//!
//! #[derive(Autowire)]
//! struct Mailer {
//!     #[inject]
//!     logger: Arc<dyn Logger>,
//!     #[param(default)]
//!     retries: u32,
//! }
//!
//! let types = TypeRegistry::new();
//! types.register(dependency_autowire::TypeDescriptor::interface("Logger"));
//! types.register_type::<FileLogger>();
//! types.register_type::<Mailer>();
//!
//! let container = Container::new(types);
//! container.bind("Logger", "FileLogger");
//! let mailer = container.get::<Mailer>("Mailer").unwrap();
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, Fields, LitStr, Type, parse_macro_input, spanned::Spanned,
};

/// Derive macro for the `Autowire` trait.
///
/// # Struct attributes
///
/// - `#[autowire(name = "...")]` - Register under this type name instead of
///   the struct's identifier.
/// - `#[autowire(implements = dyn Trait)]` - Expose built instances as
///   `Arc<dyn Trait>`. May be repeated.
///
/// # Field attributes
///
/// - `#[inject]` - Resolve the field from the container. The field type must
///   be `Arc<T>` (dependency on type `T`) or `Arc<dyn Trait>` (dependency on
///   interface `Trait`).
/// - `#[inject(name = "...")]` - Depend on an explicit type name or key.
/// - `#[param(default = expr)]` - Primitive parameter with a default value.
/// - `#[param(default)]` - Primitive parameter defaulting to `Default::default()`.
///
/// Fields without attributes are primitive parameters with no default, so
/// resolving the type fails until one is supplied. Primitive fields must be
/// `Clone`.
#[proc_macro_derive(Autowire, attributes(autowire, inject, param))]
pub fn derive_autowire(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Autowire cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Autowire can only be derived for structs",
            ));
        }
    };

    let options = StructOptions::parse(&input.attrs)?;
    let type_name = options
        .name
        .map(|name| name.value())
        .unwrap_or_else(|| ident.to_string());

    let mut params = Vec::new();
    let mut inits = Vec::new();

    match fields {
        Fields::Named(named) => {
            for (index, field) in named.named.iter().enumerate() {
                let Some(field_name) = field.ident.as_ref() else {
                    continue;
                };
                let (param, value) = field_plan(field_name.to_string(), &field.ty, &field.attrs, index)?;
                params.push(param);
                inits.push(quote! { #field_name: #value });
            }
        }
        Fields::Unit => {}
        Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                fields,
                "Autowire requires named fields or a unit struct",
            ));
        }
    }

    let body = match fields {
        Fields::Unit => quote! { Self },
        _ => quote! { Self { #(#inits),* } },
    };

    // No fields means no parameters to read
    let deps = if params.is_empty() {
        quote! { _deps }
    } else {
        quote! { deps }
    };

    let views = options.implements.iter().map(|view| {
        quote! {
            .implements(|value: ::std::sync::Arc<Self>| value as ::std::sync::Arc<#view>)
        }
    });

    Ok(quote! {
        impl ::dependency_autowire::Autowire for #ident {
            const TYPE_NAME: &'static str = #type_name;

            fn descriptor() -> ::dependency_autowire::TypeDescriptor {
                ::dependency_autowire::TypeDescriptor::concrete(Self::TYPE_NAME)
                    .with_constructor(
                        ::dependency_autowire::Constructor::new(
                            |#deps: &::dependency_autowire::Dependencies| {
                                ::std::result::Result::Ok(#body)
                            },
                        )
                        #(.param(#params))*
                    )
                    #(#views)*
            }
        }
    })
}

// =============================================================================
// Attribute parsing
// =============================================================================

#[derive(Default)]
struct StructOptions {
    name: Option<LitStr>,
    implements: Vec<Type>,
}

impl StructOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut options = StructOptions::default();

        for attr in attrs.iter().filter(|a| a.path().is_ident("autowire")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    options.name = Some(meta.value()?.parse()?);
                    Ok(())
                } else if meta.path.is_ident("implements") {
                    options.implements.push(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("expected `name` or `implements`"))
                }
            })?;
        }

        Ok(options)
    }
}

enum FieldKind {
    Inject { name: Option<LitStr> },
    Param { default: Option<Option<Expr>> },
}

fn field_kind(attrs: &[Attribute]) -> syn::Result<FieldKind> {
    for attr in attrs {
        if attr.path().is_ident("inject") {
            let mut name = None;
            if attr.meta.require_path_only().is_err() {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        name = Some(meta.value()?.parse()?);
                        Ok(())
                    } else {
                        Err(meta.error("expected `name`"))
                    }
                })?;
            }
            return Ok(FieldKind::Inject { name });
        }

        if attr.path().is_ident("param") {
            let mut default = None;
            if attr.meta.require_path_only().is_ok() {
                return Ok(FieldKind::Param { default });
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    default = Some(if meta.input.peek(syn::Token![=]) {
                        Some(meta.value()?.parse()?)
                    } else {
                        None
                    });
                    Ok(())
                } else {
                    Err(meta.error("expected `default`"))
                }
            })?;
            return Ok(FieldKind::Param { default });
        }
    }

    Ok(FieldKind::Param { default: None })
}

/// The `Parameter` expression and the `deps` accessor for one field
fn field_plan(
    name: String,
    ty: &Type,
    attrs: &[Attribute],
    index: usize,
) -> syn::Result<(TokenStream2, TokenStream2)> {
    match field_kind(attrs)? {
        FieldKind::Inject { name: explicit } => {
            let Some(inner) = extract_arc_inner_type(ty) else {
                return Err(syn::Error::new(
                    ty.span(),
                    "Fields marked with #[inject] must have type Arc<T> or Arc<dyn Trait>",
                ));
            };

            let dependency = match explicit {
                Some(lit) => lit.value(),
                None => dependency_name(inner).ok_or_else(|| {
                    syn::Error::new(inner.span(), "cannot infer a type name, use #[inject(name = \"...\")]")
                })?,
            };

            let accessor = if matches!(inner, Type::TraitObject(_)) {
                quote! { deps.view::<#inner>(#index)? }
            } else {
                quote! { deps.get::<#inner>(#index)? }
            };

            Ok((
                quote! { ::dependency_autowire::Parameter::dependency(#name, #dependency) },
                accessor,
            ))
        }
        FieldKind::Param { default } => {
            let base = quote! { ::dependency_autowire::Parameter::primitive::<#ty>(#name) };
            let param = match default {
                Some(Some(expr)) => quote! { #base.with_default::<#ty>(#expr) },
                Some(None) => {
                    quote! { #base.with_default::<#ty>(<#ty as ::std::default::Default>::default()) }
                }
                None => base,
            };

            Ok((param, quote! { deps.cloned::<#ty>(#index)? }))
        }
    }
}

/// Extract T from Arc<T>
fn extract_arc_inner_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        let segment = type_path.path.segments.last()?;
        if segment.ident == "Arc" {
            if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                    return Some(inner);
                }
            }
        }
    }
    None
}

/// `Database` for `Database` or `crate::db::Database`, `Logger` for `dyn Logger + Send`
fn dependency_name(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        Type::TraitObject(object) => object.bounds.iter().find_map(|bound| match bound {
            syn::TypeParamBound::Trait(t) => t.path.segments.last().map(|s| s.ident.to_string()),
            _ => None,
        }),
        Type::Paren(inner) => dependency_name(&inner.elem),
        _ => None,
    }
}
