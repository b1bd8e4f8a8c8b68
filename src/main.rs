use std::process;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = erdlayout::cli::run() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
