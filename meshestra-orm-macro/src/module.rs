use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, Attribute, ItemStruct, Path, Token, Type,
};

struct ModuleItem {
    attrs: Vec<Attribute>,
    path: Path,
}

impl Parse for ModuleItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let path = input.parse()?;
        Ok(ModuleItem { attrs, path })
    }
}

/// A trait binding: (dyn Trait => Impl)
struct BindingItem {
    trait_type: Type,
    impl_type: Path,
}

impl Parse for BindingItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let content;
        syn::parenthesized!(content in input);

        let trait_type: Type = content.parse()?;
        content.parse::<Token![=>]>()?;
        let impl_type: Path = content.parse()?;

        Ok(BindingItem {
            trait_type,
            impl_type,
        })
    }
}

#[derive(Default)]
struct ModuleArgs {
    imports: Vec<ModuleItem>,
    providers: Vec<ModuleItem>,
    bindings: Vec<BindingItem>,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ModuleArgs::default();

        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            let content;
            syn::bracketed!(content in input);

            if name == "imports" {
                args.imports = content
                    .parse_terminated(ModuleItem::parse, Token![,])?
                    .into_iter()
                    .collect();
            } else if name == "providers" {
                args.providers = content
                    .parse_terminated(ModuleItem::parse, Token![,])?
                    .into_iter()
                    .collect();
            } else if name == "bindings" {
                args.bindings = content
                    .parse_terminated(BindingItem::parse, Token![,])?
                    .into_iter()
                    .collect();
            } else {
                return Err(syn::Error::new_spanned(
                    &name,
                    "expected `imports`, `providers` or `bindings`",
                ));
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

pub fn module_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ModuleArgs);
    let input = parse_macro_input!(item as ItemStruct);

    TokenStream::from(generate_module_impl(&args, &input))
}

fn generate_module_impl(args: &ModuleArgs, input: &ItemStruct) -> TokenStream2 {
    let module_name = &input.ident;

    let import_registrations = args.imports.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            <#path as ::meshestra_orm::Module>::register(container)?;
        }
    });

    let provider_registrations = args.providers.iter().map(|item| {
        let path = &item.path;
        let attrs = &item.attrs;
        quote! {
            #(#attrs)*
            {
                let instance = <#path as ::meshestra_orm::Injectable>::inject(container)?;
                container.register(instance);
            }
        }
    });

    let binding_registrations = args.bindings.iter().map(|binding| {
        let trait_type = &binding.trait_type;
        let impl_type = &binding.impl_type;
        quote! {
            container.register_trait::<#trait_type, #impl_type, _>(|i| {
                i as ::std::sync::Arc<#trait_type>
            });
        }
    });

    quote! {
        #input

        impl ::meshestra_orm::Module for #module_name {
            fn register(
                container: &mut ::meshestra_orm::Container
            ) -> ::meshestra_orm::Result<()> {
                // Imports first so providers can resolve what they export
                #(#import_registrations)*

                #(#binding_registrations)*

                #(#provider_registrations)*

                Ok(())
            }
        }

        impl #module_name {
            /// Create a new container and register this module
            pub fn create_container() -> ::meshestra_orm::Result<::meshestra_orm::Container> {
                let mut container = ::meshestra_orm::Container::new();
                <Self as ::meshestra_orm::Module>::register(&mut container)?;
                Ok(container)
            }
        }
    }
}
