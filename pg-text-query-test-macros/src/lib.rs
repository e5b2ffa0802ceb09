use darling::ast::NestedMeta;
use darling::FromMeta;
use proc_macro::{Span, TokenStream};
use quote::quote;
use syn::{parse_macro_input, ItemFn};

#[derive(Debug, FromMeta)]
enum PgVersion {
    Postgres(i32),
}

impl PgVersion {
    fn get_mod_part_name(&self) -> String {
        match self {
            PgVersion::Postgres(v) => format!("postgres_{}", v),
        }
    }

    fn get_port(&self) -> Result<u16, darling::Error> {
        match self {
            PgVersion::Postgres(14) => Ok(5414),
            PgVersion::Postgres(15) => Ok(5415),
            PgVersion::Postgres(16) => Ok(5416),
            _ => Err(darling::Error::custom("Unknown postgres version")),
        }
    }
}

#[derive(Debug, FromMeta)]
struct TestArgs {
    #[darling(rename = "arg")]
    version: PgVersion,
}

/// Turns `async fn my_test(helper: &TestHelper)` into a tokio test that runs against
/// a fresh database on the Postgres instance matching the requested version.
///
/// The generated tests are ignored by default, run them with `cargo test -- --ignored`
/// once Postgres is listening on the port for the version.
#[proc_macro_attribute]
pub fn pg_test(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);

    let function_name = &input.sig.ident;

    let attr_args = match NestedMeta::parse_meta_list(args.into()) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(darling::Error::from(e).write_errors());
        }
    };

    let args = match TestArgs::from_list(&attr_args) {
        Ok(v) => v,
        Err(e) => {
            return TokenStream::from(e.write_errors());
        }
    };

    if input.sig.inputs.len() != 1 {
        return TokenStream::from(
            darling::Error::custom(format!(
                "Function is declared to have {} args, expected exactly one test helper",
                input.sig.inputs.len()
            ))
            .write_errors(),
        );
    }

    let port = match args.version.get_port() {
        Ok(p) => p,
        Err(e) => {
            return TokenStream::from(e.write_errors());
        }
    };

    let helper_name = function_name.to_string();

    let actual_test_function_name = syn::Ident::new(
        &format!("{}_{}", args.version.get_mod_part_name(), function_name),
        Span::call_site().into(),
    );

    let invoke_actual_function = if input.sig.asyncness.is_some() {
        quote! { #function_name(&helper).await; }
    } else {
        quote! { #function_name(&helper); }
    };

    let test_function = quote! {

        #input

        #[tokio::test]
        #[ignore = "requires a running postgres instance"]
        async fn #actual_test_function_name() {
            let helper = crate::test_helpers::get_test_helper_on_port(#helper_name, #port).await;

            #invoke_actual_function

            helper.stop().await;
        }
    };

    TokenStream::from(test_function)
}
