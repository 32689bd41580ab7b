use std::{env, fs, path::PathBuf};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("clipblock")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Clipblock Contributors")
        .about("Copy the content block at a point of a web page")
        .arg(clap::arg!([INPUT] "URL to fetch, local HTML or snapshot file, or '-' for stdin"))
        .arg(clap::arg!(-t --target <SELECTOR> "CSS selector of the interaction target (HTML input)"))
        .arg(clap::arg!(-p --point <POINT> "Viewport point of the interaction target, as X,Y").value_name("X,Y"))
        .arg(clap::arg!(--snapshot "Treat the input as a JSON layout snapshot instead of HTML"))
        .arg(clap::arg!(--promote "Widen the located block to its nearest copyable ancestor"))
        .arg(
            clap::arg!(-f --format <FORMAT> "Output format (markdown, plaintext)")
                .value_name("FORMAT")
                .value_parser(["markdown", "plaintext"]),
        )
        .arg(clap::arg!(--"attach-title" "Append the page title as the source"))
        .arg(clap::arg!(--"attach-url" "Append the page URL as the source"))
        .arg(
            clap::arg!(--lang <LANG> "Language of the source label (system, en, zh)")
                .value_parser(["system", "en", "zh"]),
        )
        .arg(
            clap::arg!(--settings <FILE> "Settings file (default: ~/.config/clipblock/settings.json)")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"page-url" <URL> "Page URL used for the source attachment"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--timeout <SECS> "HTTP timeout in seconds").default_value("30"))
        .arg(clap::arg!(--"user-agent" <UA> "Custom User-Agent for HTTP requests").value_name("UA"))
        .arg(clap::arg!(-v --verbose "Enable debug logging"));

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "clipblock", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "clipblock", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "clipblock", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "clipblock", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}
