use darling::FromDeriveInput;
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

#[derive(FromDeriveInput)]
#[darling(attributes(entity))]
struct EntityArgs {
    ident: syn::Ident,
    generics: syn::Generics,
    #[darling(default)]
    name: Option<String>,
}

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let args = match EntityArgs::from_derive_input(&input) {
        Ok(args) => args,
        Err(e) => return e.write_errors().into(),
    };

    let struct_name = &args.ident;
    let entity_name = args.name.unwrap_or_else(|| struct_name.to_string());
    if entity_name.trim().is_empty() {
        return syn::Error::new_spanned(struct_name, "entity name must not be empty")
            .to_compile_error()
            .into();
    }

    let (impl_generics, ty_generics, where_clause) = args.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::meshestra_orm::orm::Entity for #struct_name #ty_generics #where_clause {
            fn entity_id() -> ::meshestra_orm::orm::EntityId {
                ::meshestra_orm::orm::EntityId::from(#entity_name)
            }
        }
    };
    TokenStream::from(expanded)
}
