use proc_macro::TokenStream;
use quote::quote;
use syn::{FnArg, ItemFn, PatType};

/// Turns a typed function into a constructor for a registrable filter.
///
/// The first parameter is the running value (any `TryFromValue` type); the
/// remaining parameters are the filter's arguments (any `FromArg` type),
/// parsed from the raw argument text of the call.  The function must return
/// `Result<Value>`.
///
/// ```ignore
/// #[filter_fn]
/// pub fn postadd(value: Arc<str>, suffix: Arc<str>) -> Result<Value> {
///     Ok(Value::String(format!("{value}{suffix}").into()))
/// }
///
/// registry.register("postadd", postadd())?;
/// ```
#[proc_macro_attribute]
pub fn filter_fn(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return quote! {
            compile_error!("#[filter_fn] does not take any arguments.");
        }
        .into();
    }

    let func = match syn::parse::<ItemFn>(item) {
        Ok(func) => func,
        Err(e) => return e.to_compile_error().into(),
    };

    filter_fn_impl(func)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn typed(input: &FnArg) -> syn::Result<&PatType> {
    match input {
        FnArg::Typed(pat) => Ok(pat),
        FnArg::Receiver(recv) => Err(syn::Error::new_spanned(
            recv,
            "#[filter_fn] is not supported on methods.",
        )),
    }
}

fn filter_fn_impl(func: ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = func;

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "#[filter_fn] is not supported on generic functions.",
        ));
    }

    let name = &sig.ident;
    let mut inputs = sig.inputs.iter();

    let Some(value) = inputs.next() else {
        return Err(syn::Error::new_spanned(
            &sig,
            "a filter function takes the running value as its first parameter.",
        ));
    };
    let value_ty = &typed(value)?.ty;

    let (arg_pats, arg_tys): (Vec<_>, Vec<_>) = inputs
        .map(|input| typed(input).map(|pat| (&pat.pat, &pat.ty)))
        .collect::<syn::Result<Vec<_>>>()?
        .into_iter()
        .unzip();

    let params = &sig.inputs;
    let output = &sig.output;

    Ok(quote! {
        #(#attrs)*
        #[must_use]
        #vis fn #name() -> impl ::piper_filter_types::Filter + Send + Sync + 'static {
            struct FilterImpl;

            impl ::piper_filter_types::Filter for FilterImpl {
                type Value = #value_ty;
                type Args = (#(#arg_tys,)*);

                fn apply(
                    __value: Self::Value,
                    __args: Self::Args,
                ) -> ::piper_filter_types::Result<::piper_filter_types::Value> {
                    fn inner(#params) #output #block

                    let (#(#arg_pats,)*) = __args;
                    inner(__value, #(#arg_pats),*)
                }
            }

            FilterImpl
        }
    })
}
