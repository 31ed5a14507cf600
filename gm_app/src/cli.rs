/// Returns the config file path from the first command-line argument, or
/// the given default
pub fn get_config_path(default: &str) -> String {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 { args[1].clone() } else { default.to_string() }
}
