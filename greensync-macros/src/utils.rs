use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Options accepted by `#[greensync::main]` and `#[greensync::test]`.
///
/// ```text
/// #[greensync::main(task_capacity = 64, name = "server")]
/// ```
#[derive(Default)]
pub(crate) struct RuntimeOptions {
    task_capacity: Option<usize>,
    name: Option<String>,
}

impl RuntimeOptions {
    /// Parses the attribute arguments.
    ///
    /// Unknown keys and malformed values are reported as the error string.
    pub(crate) fn parse(attr: TokenStream) -> Result<Self, String> {
        let mut options = Self::default();
        let attr = attr.to_string();

        for part in attr.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = part.split_once('=') else {
                return Err(format!("expected `key = value`, found `{part}`"));
            };

            let value = value.trim();

            match key.trim() {
                "task_capacity" => {
                    let n = value
                        .parse::<usize>()
                        .map_err(|_| format!("task_capacity must be an integer, found `{value}`"))?;
                    options.task_capacity = Some(n);
                }
                "name" => {
                    let name = value
                        .strip_prefix('"')
                        .and_then(|v| v.strip_suffix('"'))
                        .ok_or_else(|| format!("name must be a string literal, found `{value}`"))?;
                    options.name = Some(name.to_owned());
                }
                other => return Err(format!("unknown runtime option `{other}`")),
            }
        }

        Ok(options)
    }

    /// Source of the expression building the runtime.
    pub(crate) fn builder(&self) -> String {
        let mut builder = String::from("::greensync::RuntimeBuilder::new()");

        if let Some(n) = self.task_capacity {
            builder.push_str(&format!(".task_capacity({n})"));
        }

        if let Some(name) = &self.name {
            builder.push_str(&format!(".name({name:?})"));
        }

        builder.push_str(".build()");
        builder
    }
}

/// Removes the `async` keyword from a function signature.
pub(crate) fn strip_async(tokens: &mut Vec<TokenTree>) {
    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }
}

/// Replaces the function body with the output of `wrap`.
///
/// `wrap` receives the current body as source text. Returns `None` if
/// the item has no body.
pub(crate) fn rewrite_body(
    tokens: &mut [TokenTree],
    wrap: impl FnOnce(String) -> String,
) -> Option<Result<(), String>> {
    let pos = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))?;

    let TokenTree::Group(group) = &tokens[pos] else {
        return None;
    };

    let body = wrap(group.stream().to_string());

    let stream = match body.parse::<TokenStream>() {
        Ok(stream) => stream,
        Err(err) => return Some(Err(err.to_string())),
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, stream));
    Some(Ok(()))
}

/// Expands to a `compile_error!` carrying `msg`.
pub(crate) fn compile_error(msg: &str) -> TokenStream {
    format!("compile_error!({msg:?});")
        .parse()
        .unwrap_or_default()
}
