use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::Parser, punctuated::Punctuated, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature,
    Token, Type,
};

/// Transform an asynchronous test into a synchronous one, inject
/// dependencies, and ensure that any test database is dropped regardless of
/// how the test terminates.
///
/// Injectable dependencies are [`rocket::local::asynchronous::Client`] and
/// `crate::Storage`; the client serves over the same store that is injected.
/// By default every test gets its own empty in-memory store.
///
/// Arguments, in any combination:
/// - `logging` routes the crate's log output to the test harness.
/// - `mongodb` runs over a fresh MongoDB database instead, on the server
///   named by `LABVOTE_TEST_DB_URI`. Without that variable the test is
///   skipped.
#[proc_macro_attribute]
pub fn backend_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = syn::parse_macro_input!(input as ItemFn);

    // Extract the injected arguments and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    let args = match Punctuated::<Ident, Token![,]>::parse_terminated.parse(args) {
        Ok(args) => args,
        Err(err) => return err.into_compile_error().into(),
    };
    let mut logging = false;
    let mut mongodb = false;
    for arg in args {
        if arg == "logging" {
            logging = true;
        } else if arg == "mongodb" {
            mongodb = true;
        } else {
            return syn::Error::new(arg.span(), "Expected `logging` and/or `mongodb`")
                .into_compile_error()
                .into();
        }
    }

    let maybe_logging = match logging {
        false => quote! {},
        true => quote! {
            log4rs_test_utils::test_logging::init_logging_once_for(
                ["labvote_backend"],
                None,
                None,
            );
        },
    };

    let open_storage = match mongodb {
        false => quote! {
            let storage = crate::Storage::in_memory();
            let db: Option<mongodb::Database> = None;
        },
        true => quote! {
            let Ok(db_uri) = std::env::var("LABVOTE_TEST_DB_URI") else {
                eprintln!("LABVOTE_TEST_DB_URI is not set, skipping");
                return None;
            };
            let db_name = format!("labvote_test_{}", mongodb::bson::oid::ObjectId::new());
            let (storage, db) = crate::config::connect_mongodb(&db_uri, &db_name)
                .await
                .unwrap();
            let db = Some(db);
        },
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// Test setup.
            async fn setup() -> Option<(
                rocket::local::asynchronous::Client,
                crate::Storage,
                Option<mongodb::Database>,
            )> {
                #open_storage
                let rocket_client =
                    rocket::local::asynchronous::Client::tracked(crate::rocket_for_storage(storage.clone()))
                        .await
                        .unwrap();
                Some((rocket_client, storage, db))
            }

            /// The test itself.
            #item_fn

            /// Test cleanup.
            async fn cleanup(db: Option<mongodb::Database>) {
                if let Some(db) = db {
                    db.drop(None).await.unwrap();
                }
            }

            #maybe_logging

            // Create an async runtime. We need a separate one for inside and
            // outside the `catch_unwind`.
            let outer_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("test-setup-cleanup")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();
            let inner_runtime = rocket::tokio::runtime::Builder::new_multi_thread()
                .thread_name("rocket-worker-test-thread")
                .worker_threads(1)
                .enable_all()
                .build()
                .unwrap();

            // Run the setup.
            let Some((rocket_client, storage, db)) = outer_runtime.block_on(setup()) else {
                return;
            };

            // Run the test, catching any panics.
            // Use mutexes to safely transfer `!UnwindSafe` data.
            let client_mutex = std::sync::Mutex::new(rocket_client);
            let storage_mutex = std::sync::Mutex::new(storage);
            let runtime_mutex = std::sync::Mutex::new(inner_runtime);
            let result = std::panic::catch_unwind(|| {
                #[allow(unused_variables)]
                let rocket_client = client_mutex.into_inner().unwrap();
                #[allow(unused_variables)]
                let storage = storage_mutex.into_inner().unwrap();
                let runtime = runtime_mutex.into_inner().unwrap();

                runtime.block_on(#new_name(#(#test_args),*));
            });

            // Run the cleanup.
            outer_runtime.block_on(cleanup(db));

            // If the test panicked, re-raise the panic.
            if let Err(cause) = result {
                std::panic::resume_unwind(cause);
            }
        }
    }
    .into()
}

/// Ensure the wrapped test is async, and map its parameters to injected values.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_client = false;
    let mut has_storage = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let (Pat::Ident(_), Type::Path(type_path)) = (&*pat_type.pat, &*pat_type.ty) {
                if let Some(type_ident) = type_path.path.get_ident() {
                    if type_ident == "Client" {
                        if has_client {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `rocket::local::asynchronous::Client`",
                            ));
                        }
                        has_client = true;
                        args.push(quote! { rocket_client });
                        continue;
                    } else if type_ident == "Storage" {
                        if has_storage {
                            return Err(syn::Error::new(
                                input.span(),
                                "Test cannot accept more than one `Storage`",
                            ));
                        }
                        has_storage = true;
                        args.push(quote! { storage });
                        continue;
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `client_ident: Client` or `storage_ident: Storage`",
        ));
    }

    Ok(args)
}
