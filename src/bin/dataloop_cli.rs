//! Demo harness driving a [`DataRunloop`] inline from a plain CLI, mostly
//! useful for exercising the real collaborators (`StdFsOpener`,
//! `ReqwestTransport`, `ImagePngDecoderFactory`) outside of a test fake.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use horizon_lattice_dataloop::command::PostKind;
use horizon_lattice_dataloop::http_transport::ReqwestTransport;
use horizon_lattice_dataloop::nbio::StdFsOpener;
use horizon_lattice_dataloop::png_decoder::ImagePngDecoderFactory;
use horizon_lattice_dataloop::DataRunloopBuilder;

fn usage() -> ! {
    eprintln!(
        "usage:\n  dataloop-cli load-file <path>\n  dataloop-cli load-wallpaper <path>\n  dataloop-cli fetch <url> [tag]"
    );
    std::process::exit(2);
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = env::args().skip(1);
    let Some(subcommand) = args.next() else {
        usage();
    };

    let wallpaper_result = Arc::new(parking_lot::Mutex::new(None));
    let wallpaper_result_for_sink = wallpaper_result.clone();
    let list_result = Arc::new(parking_lot::Mutex::new(None));
    let list_result_for_sink = list_result.clone();

    let engine = DataRunloopBuilder::new(
        Arc::new(StdFsOpener),
        Arc::new(ReqwestTransport::new()),
        Arc::new(ImagePngDecoderFactory),
    )
    .wallpaper_sink(Arc::new(move |pixels, width, height| {
        *wallpaper_result_for_sink.lock() = Some((pixels.len(), width, height));
    }))
    .core_updater_list_sink(Arc::new(move |body| {
        *list_result_for_sink.lock() = Some(body);
    }))
    .build();
    engine.init();

    match subcommand.as_str() {
        "load-file" => {
            let Some(path) = args.next() else { usage() };
            engine.post(PostKind::File, &path, "", 0, Duration::ZERO, false);
            while engine.file_lane_busy() {
                engine.tick();
            }
            println!("loaded {path}");
        }
        "load-wallpaper" => {
            let Some(path) = args.next() else { usage() };
            engine.post(PostKind::File, &path, "cb_menu_wallpaper", 0, Duration::ZERO, false);
            while engine.file_lane_busy() {
                engine.tick();
            }
            match wallpaper_result.lock().take() {
                Some((byte_len, width, height)) => {
                    println!("decoded {path}: {width}x{height}, {byte_len} rgba bytes");
                }
                None => {
                    eprintln!("failed to decode {path} as a png");
                    return ExitCode::FAILURE;
                }
            }
        }
        "fetch" => {
            let Some(url) = args.next() else { usage() };
            let tag = args.next().unwrap_or_default();
            engine.post(PostKind::Http, &url, &tag, 0, Duration::ZERO, false);
            while engine.http_lane_busy() {
                engine.tick();
            }
            if tag == "cb_core_updater_list" {
                match list_result.lock().take() {
                    Some(body) => println!("fetched {} bytes from {url}", body.len()),
                    None => println!("fetched {url} (sink did not run, or the transfer failed)"),
                }
            } else {
                println!("fetched {url}");
            }
        }
        _ => usage(),
    }

    engine.deinit();
    ExitCode::SUCCESS
}
