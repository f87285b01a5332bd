use motion_sensors::{
    init_tracing, load_config, MotionSensors, SensorKind, SimulatedPort,
};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tokio_stream::{StreamExt, StreamMap};
use tracing::{info, warn};

/// Interval the accelerometer is switched to halfway through the run
const FAST_INTERVAL_US: u64 = 20_000;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug for lifecycle detail, RUST_LOG=trace for every sample
    init_tracing();

    info!("[motion_sensors] starting up...");

    // Load configuration from CONFIG_PATH or default
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    let config = load_config(&format!("{}/motion_sensors.toml", config_path))?;
    info!(
        "[config] {} sensor override(s), {:?} acceleration units",
        config.sensors.len(),
        config.platform.acceleration_units
    );

    let port = Arc::new(SimulatedPort::from_config(&config));
    let hub = MotionSensors::with_config(port.clone(), &config);

    for kind in SensorKind::ALL {
        let Some(code) = kind.type_code() else {
            continue;
        };
        let call = format!(r#"{{"method":"isSensorAvailable","arguments":{}}}"#, code);
        info!("[main] {} available: {:?}", kind, hub.handle_json(&call)?);
    }

    let mut streams = StreamMap::new();
    for kind in SensorKind::ALL {
        streams.insert(kind, hub.listen(kind));
    }
    info!("[main] listening on {} streams", streams.len());

    let run_for = Duration::from_secs(config.demo.run_seconds);
    let deadline = sleep(run_for);
    let reconfigure = sleep(run_for / 2);
    tokio::pin!(deadline, reconfigure);
    let mut reconfigured = false;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut reconfigure, if !reconfigured => {
                reconfigured = true;
                let call = format!(
                    r#"{{"method":"setSensorUpdateInterval","arguments":{{"sensorType":{},"interval":{}}}}}"#,
                    SensorKind::Accelerometer.type_code().unwrap_or_default(),
                    FAST_INTERVAL_US
                );
                hub.handle_json(&call)?;
                info!("[main] accelerometer switched to {}us", FAST_INTERVAL_US);
            }
            next = streams.next() => match next {
                Some((kind, sample)) => info!("[{}] {}", kind, sample.to_json()?),
                None => {
                    warn!("[main] every stream has ended");
                    break;
                }
            },
        }
    }

    hub.cancel_all();
    info!(
        "[main] done: {} registration(s), {} unregistration(s)",
        port.registered_total(),
        port.unregistered_total()
    );
    Ok(())
}
