//! Procedural macros for the turnstile runtime.
//!
//! These are re-exported by `turnstile` and meant to be used from there:
//! `#[turnstile::main]`, `#[turnstile::test]` and `turnstile::join!`.

mod args;
use args::RuntimeArgs;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Error, Expr, ItemFn, Token, parse_macro_input};

/// Builds the runtime expression shared by `main` and `test`.
fn runtime_builder(args: &RuntimeArgs) -> TokenStream2 {
    let event_interval = args
        .event_interval
        .as_ref()
        .map(|n| quote! { .event_interval(#n) });

    quote! {
        ::turnstile::RuntimeBuilder::new()
            #event_interval
            .build()
            .expect("failed to build runtime")
    }
}

/// Runs an `async fn main` on a fresh turnstile runtime.
///
/// ```text
/// #[turnstile::main(event_interval = 16)]
/// async fn main() { ... }
/// ```
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as RuntimeArgs);
    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return Error::new_spanned(
            input.sig.fn_token,
            "#[turnstile::main] must be used on an async function",
        )
        .to_compile_error()
        .into();
    }

    if input.sig.ident != "main" {
        return Error::new_spanned(&input.sig.ident, "#[turnstile::main] must be used on fn main")
            .to_compile_error()
            .into();
    }

    let attrs = &input.attrs;
    let vis = &input.vis;
    let block = &input.block;
    let mut sig = input.sig.clone();
    sig.asyncness = None;

    let runtime = runtime_builder(&args);

    quote! {
        #(#attrs)*
        #vis #sig {
            #runtime.block_on(async #block)
        }
    }
    .into()
}

/// Turns an `async fn` into a `#[test]` driven by a fresh turnstile
/// runtime.
///
/// Accepts the same arguments as `#[turnstile::main]`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as RuntimeArgs);
    let input = parse_macro_input!(item as ItemFn);

    if input.sig.asyncness.is_none() {
        return Error::new_spanned(
            input.sig.fn_token,
            "#[turnstile::test] must be used on an async function",
        )
        .to_compile_error()
        .into();
    }

    if !input.sig.inputs.is_empty() {
        return Error::new_spanned(&input.sig.inputs, "test functions cannot take arguments")
            .to_compile_error()
            .into();
    }

    let attrs = &input.attrs;
    let vis = &input.vis;
    let block = &input.block;
    let mut sig = input.sig.clone();
    sig.asyncness = None;

    let runtime = runtime_builder(&args);

    quote! {
        #[::core::prelude::v1::test]
        #(#attrs)*
        #vis #sig {
            #runtime.block_on(async #block)
        }
    }
    .into()
}

/// Polls several futures concurrently from the current task and resolves
/// to the tuple of their outputs.
///
/// Every argument is evaluated, in order, before anything is polled. Each
/// poll of the join polls the unfinished futures in argument order.
///
/// ```text
/// let (a, b) = turnstile::join!(async { 1 }, async { 2 });
/// ```
#[proc_macro]
pub fn join(input: TokenStream) -> TokenStream {
    let parser = Punctuated::<Expr, Token![,]>::parse_terminated;
    let futures = match parser.parse(input) {
        Ok(futures) => futures,
        Err(err) => return err.to_compile_error().into(),
    };

    match futures.len() {
        0 => return quote! { () }.into(),
        1 => {
            let future = &futures[0];
            return quote! { (#future).await }.into();
        }
        _ => {}
    }

    let exprs: Vec<&Expr> = futures.iter().collect();
    let slots: Vec<_> = (0..exprs.len())
        .map(|i| format_ident!("__turnstile_join_future_{}", i))
        .collect();
    let outputs: Vec<_> = (0..exprs.len())
        .map(|i| format_ident!("__turnstile_join_output_{}", i))
        .collect();

    quote! {
        {
            #(
                let mut #slots = ::std::boxed::Box::pin(#exprs);
                let mut #outputs = ::core::option::Option::None;
            )*

            ::std::future::poll_fn(|cx| {
                let mut pending = false;

                #(
                    if #outputs.is_none() {
                        match ::std::future::Future::poll(#slots.as_mut(), cx) {
                            ::std::task::Poll::Ready(value) => #outputs = ::core::option::Option::Some(value),
                            ::std::task::Poll::Pending => pending = true,
                        }
                    }
                )*

                if pending {
                    return ::std::task::Poll::Pending;
                }

                ::std::task::Poll::Ready((
                    #( #outputs.take().expect("join output taken twice"), )*
                ))
            })
            .await
        }
    }
    .into()
}
