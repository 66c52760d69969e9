use anyhow::Result;
use api_assembly::adapters::handlers::StubHandler;
use api_assembly::app::petstore;
use api_assembly::utils::validation::Validate;
use api_assembly::{ApiBuilder, ApiConfig, ApiError, DispatchState, Dispatcher, Method, Request};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_default_security_from_config_protects_reads() -> Result<()> {
    let file = write_config(
        r#"
[api]
name = "locked-petstore"

[security]
default_schemes = ["apiKey"]
"#,
    );
    let config = ApiConfig::from_file(file.path())?;
    config.validate()?;

    let dispatcher = Dispatcher::new(Arc::new(petstore::new_api(&config)?));
    assert_eq!(dispatcher.api().name(), "locked-petstore");

    let failure = dispatcher
        .dispatch(Request::new(Method::Get, "/pets"))
        .await
        .unwrap_err();
    assert_eq!(failure.state, DispatchState::Authenticating);

    let response = dispatcher
        .dispatch(Request::new(Method::Get, "/pets").header("x-api-key", "token123"))
        .await?;
    assert_eq!(response.status, 200);

    // 自行宣告的 scheme 不受預設值影響
    let response = dispatcher
        .dispatch(Request::new(Method::Delete, "/pets/3").basic_auth("admin", "admin"))
        .await?;
    assert_eq!(response.granted_by.as_deref(), Some("basic"));
    Ok(())
}

#[tokio::test]
async fn test_default_producer_from_config() -> Result<()> {
    let config = ApiConfig::from_toml_str(
        r#"
[api]
default_producer = "application/toml"
"#,
    )?;
    let dispatcher = Dispatcher::new(Arc::new(petstore::new_api(&config)?));

    let response = dispatcher
        .dispatch(Request::new(Method::Get, "/pets/1"))
        .await?;
    assert_eq!(response.content_type.as_deref(), Some("application/toml"));

    let response = dispatcher
        .dispatch(Request::new(Method::Get, "/pets/1").accept("*/*"))
        .await?;
    assert_eq!(response.content_type.as_deref(), Some("application/toml"));
    Ok(())
}

#[test]
fn test_unregistered_default_scheme_fails_assembly() {
    let config = ApiConfig::from_toml_str(
        r#"
[security]
default_schemes = ["oauth2"]
"#,
    )
    .unwrap();
    assert!(config.validate().is_ok());

    let Err(ApiError::Assembly { problems }) = petstore::new_api(&config) else {
        panic!("expected assembly failure");
    };
    assert!(problems
        .iter()
        .any(|problem| problem == "default security scheme oauth2 is not registered"));
}

#[test]
fn test_strict_routes_from_config() {
    let config = ApiConfig::from_toml_str(
        r#"
[api]
strict_routes = true
"#,
    )
    .unwrap();

    // pet store 本身沒有重疊的樣板
    assert!(petstore::new_api(&config).is_ok());

    let mut builder = ApiBuilder::from_config(&config);
    petstore::register(&mut builder, petstore::PetStore::new()).unwrap();
    builder
        .register_operation(Method::Get, "/pets/featured", StubHandler::new())
        .unwrap();

    let Err(ApiError::Assembly { problems }) = builder.build() else {
        panic!("expected overlap to be rejected");
    };
    assert_eq!(
        problems,
        vec!["GET /pets/{id} overlaps GET /pets/featured".to_string()]
    );
}
