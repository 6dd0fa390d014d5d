//! Attribute macros that run an async function on a greensync runtime.

mod utils;

use proc_macro::{TokenStream, TokenTree};
use utils::RuntimeOptions;

/// Runs an `async fn main` on a fresh runtime.
///
/// Accepts `task_capacity = N` and `name = "..."`, forwarded to
/// `RuntimeBuilder`.
#[proc_macro_attribute]
pub fn main(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = match RuntimeOptions::parse(attr) {
        Ok(options) => options,
        Err(msg) => return utils::compile_error(&msg),
    };

    let mut tokens: Vec<TokenTree> = item.into_iter().collect();
    utils::strip_async(&mut tokens);

    let builder = options.builder();
    let rewritten = utils::rewrite_body(&mut tokens, |body| {
        format!(
            "{{
                let runtime = {builder};
                runtime
                    .block_on(async move {{
                        {body}
                    }})
            }}"
        )
    });

    match rewritten {
        Some(Ok(())) => tokens.into_iter().collect(),
        Some(Err(err)) => utils::compile_error(&format!("main macro error: {err}")),
        None => utils::compile_error("#[greensync::main] expects a function with a body"),
    }
}

/// Turns an `async fn` into a `#[test]` running on a fresh runtime.
///
/// Accepts the same options as [`macro@main`].
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = match RuntimeOptions::parse(attr) {
        Ok(options) => options,
        Err(msg) => return utils::compile_error(&msg),
    };

    let mut tokens: Vec<TokenTree> = item.into_iter().collect();
    utils::strip_async(&mut tokens);

    let builder = options.builder();
    let rewritten = utils::rewrite_body(&mut tokens, |body| {
        format!(
            "{{
                let runtime = {builder};
                runtime
                    .block_on(async move {{ {body} }});
            }}"
        )
    });

    match rewritten {
        Some(Ok(())) => {}
        Some(Err(err)) => return utils::compile_error(&format!("test macro error: {err}")),
        None => return utils::compile_error("#[greensync::test] expects a function with a body"),
    }

    let test_attr: TokenStream = "#[test]".parse().unwrap_or_default();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
