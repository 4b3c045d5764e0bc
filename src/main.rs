#[cfg(not(feature = "trace"))]
use std::io::Write;

use anyhow::Context;
use sprite3d::prelude::*;

mod scene;
use scene::DemoScene;

const DEFAULT_LOG_FILTER: &str = "sprite3d=info,sprite3d_core=debug,wgpu=error";

fn main() -> anyhow::Result<()> {
    std::env::set_var("RUST_BACKTRACE", "1");

    #[cfg(feature = "trace")]
    sprite3d_core::install_tracing(DEFAULT_LOG_FILTER)
        .context("Could not install the tracing subscriber")?;
    #[cfg(not(feature = "trace"))]
    init_logger();

    let engine = Sprite3dEngine::<DemoScene>::new();
    engine.run().context("The event loop stopped with an error")
}

#[cfg(not(feature = "trace"))]
fn init_logger() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", DEFAULT_LOG_FILTER);
    }
    env_logger::builder()
        .format(|buf, record| {
            let ts = buf.timestamp_micros();
            let ts = ts.to_string();
            let timestamp = &ts[11..ts.len()-1];
            let level = buf.default_styled_level(record.level());
            let width = 27;
            let mod_path = match record.module_path() {
                Some(path) => format!("{:<width$}", path),
                None => format!("{:width$}", ""),
            };
            writeln!(buf, "[{ts} {lvl} {path}]: {msg}", ts=timestamp, lvl=level, path=buf.style().set_dimmed(true).value(mod_path), msg=record.args())
        })
        .init();
}
