fn main() {
    telemetry_pipeline::cli::run();
}
