use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Type};

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    generate_injectable_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn generate_injectable_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => {
                let injections = fields.named.iter().map(|field| {
                    let field_name = &field.ident;
                    let resolve = resolve_expr(&field.ty);
                    quote!(#field_name: #resolve)
                });
                quote!(Self { #(#injections),* })
            }
            Fields::Unit => quote!(Self),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    struct_name,
                    "#[derive(Injectable)] only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "#[derive(Injectable)] can only be applied to structs",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::meshestra_orm::Injectable for #struct_name #ty_generics #where_clause {
            fn inject(
                container: &::meshestra_orm::Container
            ) -> ::meshestra_orm::Result<Self> {
                Ok(#body)
            }
        }
    })
}

fn resolve_expr(ty: &Type) -> TokenStream2 {
    let inner = extract_injectable_type(ty);
    match &inner {
        Type::TraitObject(_) => quote!(container.resolve_trait::<#inner>()?),
        _ => quote!(container.resolve::<#inner>()?),
    }
}

/// Extract the inner type from Arc<T> or Arc<dyn Trait>
fn extract_injectable_type(ty: &Type) -> Type {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Arc" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner_type)) = args.args.first() {
                        return inner_type.clone();
                    }
                }
            }
        }
    }

    ty.clone()
}
