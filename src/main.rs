use std::process::ExitCode;

fn main() -> ExitCode {
    match loadsmith::entry::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
