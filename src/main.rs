use std::process::ExitCode;

fn main() -> ExitCode {
    match mapconv_rust::run() {
        Ok(report) => report.exit_code(),
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(2)
        }
    }
}
