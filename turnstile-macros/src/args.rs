use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Error, Expr, ExprLit, Lit, LitInt, MetaNameValue, Token};

/// Arguments accepted by `#[turnstile::main(...)]` and
/// `#[turnstile::test(...)]`.
///
/// ```text
/// #[turnstile::main(event_interval = 16)]
/// ```
#[derive(Default)]
pub(crate) struct RuntimeArgs {
    /// Forwarded to `RuntimeBuilder::event_interval` when present.
    pub(crate) event_interval: Option<LitInt>,
}

impl Parse for RuntimeArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = RuntimeArgs::default();
        let pairs = Punctuated::<MetaNameValue, Token![,]>::parse_terminated(input)?;

        for pair in pairs {
            if !pair.path.is_ident("event_interval") {
                return Err(Error::new_spanned(
                    &pair.path,
                    "unknown argument, expected `event_interval`",
                ));
            }

            if args.event_interval.is_some() {
                return Err(Error::new_spanned(
                    &pair.path,
                    "`event_interval` is set more than once",
                ));
            }

            match pair.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Int(value),
                    ..
                }) => args.event_interval = Some(value),
                other => {
                    return Err(Error::new_spanned(
                        other,
                        "`event_interval` expects an integer literal",
                    ));
                }
            }
        }

        Ok(args)
    }
}
