#![deny(unsafe_code)]

use std::{env, io, process::ExitCode};

fn main() -> ExitCode {
    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let code = cli::run(env::args_os(), &mut stdout, &mut stderr);
    cli::exit_code_from(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn binary_links_against_the_cli_crate() {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = cli::run(
            ["duplicity-select", "/no/such/root/for/this/test"],
            &mut stdout,
            &mut stderr,
        );
        assert_eq!(code, core::exit_code::ExitCode::SelectionSetup);
        let _ = writeln!(io::stderr(), "{}", String::from_utf8_lossy(&stderr));
    }
}
