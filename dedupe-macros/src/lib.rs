use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse::Parser,
    parse_macro_input, FnArg, ItemFn, Meta, ReturnType,
};

/// Procedural macro to protect async functions with `Coordinator::protect`
/// deduplication.
///
/// # Example
///
/// ```rust,ignore
/// #[protect(coordinator = self.cache, id = email.id)]
/// async fn send_email(&self, email: Email) -> Result<String, Error> {
///     // Your processing logic here
///     Ok("sent".to_string())
/// }
/// ```
///
/// This expands to code that calls
/// `coordinator.protect(id, || async { ... }).await`. The function's
/// declared return type becomes the wrapped call's return type, so it must
/// be `Result<Option<A>, Error>` — `None` when a peer already handled `id`.
///
/// # Requirements
///
/// - The function must be `async`
/// - The function must return `Result<Option<A>, Error>`
/// - The `id` expression must evaluate to the `Coordinator`'s `Id` type
#[proc_macro_attribute]
pub fn protect(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let parser = syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated;
    let args = match parser.parse(attr.clone()) {
        Ok(args) => args,
        Err(e) => return e.to_compile_error().into(),
    };

    let mut coordinator_expr = None;
    let mut id_expr = None;

    for arg in args {
        match arg {
            Meta::NameValue(nv) => {
                let name = nv.path.get_ident().map(|i| i.to_string());
                match name.as_deref() {
                    Some("coordinator") => {
                        coordinator_expr = Some(nv.value);
                    }
                    Some("id") => {
                        id_expr = Some(nv.value);
                    }
                    _ => {
                        return syn::Error::new_spanned(
                            nv.path,
                            "Unknown attribute parameter. Expected 'coordinator' or 'id'",
                        )
                        .to_compile_error()
                        .into();
                    }
                }
            }
            _ => {
                return syn::Error::new_spanned(
                    arg,
                    "Expected name-value pair like `coordinator = self.dedup` or `id = email.id`",
                )
                .to_compile_error()
                .into();
            }
        }
    }

    let coordinator = match coordinator_expr {
        Some(expr) => expr,
        None => {
            return syn::Error::new(
                proc_macro2::Span::call_site(),
                "Missing required 'coordinator' parameter",
            )
            .to_compile_error()
            .into();
        }
    };

    let id = match id_expr {
        Some(expr) => expr,
        None => {
            return syn::Error::new(
                proc_macro2::Span::call_site(),
                "Missing required 'id' parameter",
            )
            .to_compile_error()
            .into();
        }
    };

    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            input.sig.fn_token,
            "The #[protect] macro can only be applied to async functions",
        )
        .to_compile_error()
        .into();
    }

    let fn_vis = &input.vis;
    let fn_name = &input.sig.ident;
    let fn_generics = &input.sig.generics;
    let fn_inputs = &input.sig.inputs;
    let fn_output = &input.sig.output;
    let fn_block = &input.block;
    let fn_attrs = &input.attrs;

    let param_names: Vec<_> = fn_inputs
        .iter()
        .filter_map(|arg| {
            if let FnArg::Typed(pat_type) = arg {
                if let syn::Pat::Ident(pat_ident) = &*pat_type.pat {
                    return Some(&pat_ident.ident);
                }
            }
            None
        })
        .collect();

    let return_type = match fn_output {
        ReturnType::Default => {
            return syn::Error::new_spanned(&input.sig, "Function must return Result<Option<A>, Error>")
                .to_compile_error()
                .into();
        }
        ReturnType::Type(_, ty) => ty,
    };

    let expanded = quote! {
        #(#fn_attrs)*
        #fn_vis async fn #fn_name #fn_generics(#fn_inputs) -> #return_type {
            let __dedupe_id = #id;
            let __dedupe_coordinator = #coordinator;

            __dedupe_coordinator.protect(__dedupe_id, || async move {
                #(let #param_names = #param_names;)*
                #fn_block
            }).await
        }
    };

    TokenStream::from(expanded)
}
