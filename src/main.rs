use std::process::ExitCode;

fn main() -> ExitCode {
    match pdfshade::run(std::env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let err = anyhow::Error::from(err);
            eprintln!("pdfshade: {err:#}");
            ExitCode::FAILURE
        }
    }
}
