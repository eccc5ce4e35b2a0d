use proc_macro::TokenStream;
use quote::quote;
use syn::{
    punctuated::Punctuated, token::Comma, FnArg, PatType, Path, PathArguments, PathSegment,
    TypePath,
};

/// Turn an async scenario into a test that runs against the live deployment.
///
/// The function must be `async` and take exactly one argument of type
/// `TestingTools`, usually destructured. It runs on its own current-thread
/// runtime through `crate::contract_test`, inside a span named after the
/// function.
///
/// The generated test is ignored unless the calling crate is built with its
/// `live-service` feature, because it needs a running deployment.
///
/// Other attributes on the function are kept. A `#[test]` attribute is added
/// if there isn't one already.
///
/// # Example:
///
/// ```ignore
/// use petclinic_api_tests::{contract_test_macro, TestingTools};
///
/// #[contract_test_macro]
/// async fn owners_are_listed(TestingTools { profiles, .. }: TestingTools) -> anyhow::Result<()> {
///     // one call through profiles.read, then assertions
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn contract_test(attributes: TokenStream, item: TokenStream) -> TokenStream {
    if !attributes.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "contract_test does not take arguments",
        )
        .into_compile_error()
        .into();
    }

    // Parse the function that this macro is attached to.
    let mut input = syn::parse_macro_input!(item as syn::ItemFn);
    let attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &mut input.sig;
    let body = &input.block;

    // If the function doesn't have a #[test] attribute, we'll need to provide one.
    let has_test_attr = attrs.iter().any(|attr| attr.path().is_ident("test"));
    let missing_test_attr = if has_test_attr {
        quote!()
    } else {
        quote!(#[test])
    };

    // Check that function is async. Then remove `async` from the signature, so
    // we can reuse the same signature for our blocking sync outer function.
    if sig.asyncness.is_none() {
        return syn::Error::new_spanned(
            sig.fn_token,
            "the async keyword is missing from the function declaration",
        )
        .to_compile_error()
        .into();
    }
    sig.asyncness = None;

    // Take the `TestingTools` arg. It carries the pattern that defines the
    // bindings the scenario expects, so it becomes the closure's parameter.
    let original_args = sig.inputs.clone();
    let mut testing_tools_arg = None;

    for arg in &original_args {
        let is_testing_tools = match arg {
            FnArg::Typed(PatType { ty, .. }) => match &**ty {
                syn::Type::Path(TypePath {
                    qself: None,
                    path: Path { segments, .. },
                }) => matches!(
                    segments.last(),
                    Some(PathSegment {
                        arguments: PathArguments::None,
                        ident,
                    }) if *ident == "TestingTools"
                ),
                _ => false,
            },
            FnArg::Receiver(_) => false,
        };

        if !is_testing_tools || testing_tools_arg.is_some() {
            return syn::Error::new_spanned(
                arg,
                "contract tests take a single argument of type TestingTools",
            )
            .into_compile_error()
            .into();
        }
        testing_tools_arg = Some(arg.clone());
    }

    let testing_tools_arg = match testing_tools_arg {
        Some(arg) => arg,
        None => {
            return syn::Error::new_spanned(sig, "expected an argument of type TestingTools")
                .into_compile_error()
                .into();
        }
    };

    sig.inputs = Punctuated::<FnArg, Comma>::new();
    let scenario = sig.ident.to_string();

    // output the built test function

    (quote! {
        #(#attrs)*
        #missing_test_attr
        #[cfg_attr(
            not(feature = "live-service"),
            ignore = "needs a running deployment, enable the live-service feature"
        )]
        #vis #sig {
            ::tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("could not build a runtime for the scenario")
                .block_on(async {
                    // crate here refers to `petclinic-api-tests`
                    crate::contract_test(
                        #scenario,
                        | #testing_tools_arg | async move #body
                    ).await
                })
        }
    })
    .into()
}
