fn main() -> anyhow::Result<()> {
    neon_globe::start()
}
