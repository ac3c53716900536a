use ledmap::{analyze_clip, CancelToken, ImageSequence, LedMapConfig, NullSink};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "tracing")]
    ledmap::init_tracing(false);
    #[cfg(not(feature = "tracing"))]
    ledmap::core::init_with_level(log::LevelFilter::Info)?;

    let mut args = std::env::args().skip(1);
    let Some(dir) = args.next() else {
        eprintln!("Usage: analyze_clip <frames_dir> [expected_total] [config.json]");
        return Ok(());
    };
    let expected: Option<u32> = args.next().map(|s| s.parse()).transpose()?;
    let config = match args.next() {
        Some(path) => LedMapConfig::load_json(path)?,
        None => LedMapConfig::default(),
    };

    let mut params = config.tracker;
    if expected.is_some() {
        params.expected_total = expected;
    }

    let mut frames = ImageSequence::from_dir(&dir)?;
    if frames.is_empty() {
        eprintln!("no image files in {dir}");
        return Ok(());
    }
    let result = analyze_clip(&mut frames, params, &CancelToken::new(), &mut NullSink)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
