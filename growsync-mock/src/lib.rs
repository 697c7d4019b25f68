use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::net::TcpListener;
use tokio::sync::RwLock;

use crate::app::create_app;
use crate::settings::{Settings, Simulation};
use crate::simulate::{record_readings, seed};
use crate::store::DataStore;

pub mod app;
pub mod handles;
pub mod settings;
pub mod simulate;
pub mod store;

pub async fn run(settings: &Arc<Settings>) -> Result<(), Box<dyn Error>> {
    let store = Arc::new(RwLock::new(DataStore::with_retention(settings.simulation.retention)));

    {
        let mut store = store.write().await;
        seed(&mut store, &settings.simulation, unix_now());
        tracing::info!("seeded {} documents", store.len());
    }

    tokio::spawn(generate(Arc::clone(&store), settings.simulation.clone()));

    let app = create_app(settings, store);

    let address = SocketAddr::from((settings.server.host.parse::<IpAddr>()?, settings.server.port));
    let listener = TcpListener::bind(&address).await?;

    tracing::info!("serving {} on {:?}", settings.database.name, address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Append one reading per variable and environment every `interval_ms`.
pub async fn generate(store: Arc<RwLock<DataStore>>, simulation: Simulation) {
    let mut interval = tokio::time::interval(Duration::from_millis(simulation.interval_ms.max(1)));

    loop {
        interval.tick().await;

        let timestamp = unix_now();
        record_readings(&mut *store.write().await, &simulation, timestamp);

        tracing::debug!("recorded readings at {:.3}", timestamp);
    }
}

/// Seconds since the epoch, as the views store them.
pub fn unix_now() -> f64 {
    OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1_000_000_000.0
}
