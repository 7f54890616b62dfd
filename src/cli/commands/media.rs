use clap::{Arg, Command};

pub const ARG_MEDIA_DIR: &str = "media-dir";
pub const ARG_PUBLIC_BASE_URL: &str = "public-base-url";
pub const ARG_MAX_UPLOAD_BYTES: &str = "max-upload-bytes";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MEDIA_DIR)
                .long(ARG_MEDIA_DIR)
                .help("Directory holding the photos and videos buckets")
                .env("SANCTUARY_MEDIA_DIR")
                .default_value("media"),
        )
        .arg(
            Arg::new(ARG_PUBLIC_BASE_URL)
                .long(ARG_PUBLIC_BASE_URL)
                .help("Base URL used to build public links to stored media")
                .env("SANCTUARY_PUBLIC_BASE_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_MAX_UPLOAD_BYTES)
                .long(ARG_MAX_UPLOAD_BYTES)
                .help("Largest accepted request body in bytes (uploads arrive base64 encoded)")
                .env("SANCTUARY_MAX_UPLOAD_BYTES")
                .default_value("52428800")
                .value_parser(clap::value_parser!(usize)),
        )
}
