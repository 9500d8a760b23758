fn main() -> color_eyre::Result<()> {
	tea_login::cli::run()
}
