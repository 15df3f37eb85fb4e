use std::sync::Arc;

use bytes::Bytes;
use color_eyre::eyre::{WrapErr, eyre};
use http::{Method, Request, header::CONTENT_TYPE};
use soap_wsse::{
    config::Config,
    middleware::{Client, HttpTransport, WsseMiddleware},
    soap::{SOAP_ACTION_HEADER, wsse::RemoteSigner},
    telemetry,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(action)) = (args.next(), args.next()) else {
        return Err(eyre!("usage: soap-wsse <envelope.xml> <soap-action>"));
    };

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Loaded configuration: {:?}", config);

    let middleware = WsseMiddleware::from_settings(&config.wsse)?;
    if let Some(signer) = &config.signer {
        let remote = RemoteSigner::from_config(signer)?;
        middleware.with_external_signer(Arc::new(remote), signer.actions.clone());
    }

    let transport = HttpTransport::from_config(&config.transport)?;
    let client = Client::new(transport).with(middleware);

    let envelope = tokio::fs::read(&path)
        .await
        .wrap_err_with(|| format!("failed to read {path}"))?;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(CONTENT_TYPE, "text/xml; charset=utf-8")
        .header(SOAP_ACTION_HEADER, format!("\"{action}\""))
        .body(Bytes::from(envelope))?;

    let response = client.send(request).await?;
    eprintln!("{}", response.status());
    println!("{}", String::from_utf8_lossy(response.body()));
    Ok(())
}
