use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod core;
mod kernel;
mod net;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let krn = kernel::boot().await?;
    krn.setup_http_adapter().run().await
}
