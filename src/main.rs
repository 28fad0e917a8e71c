fn main() -> anyhow::Result<()> {
    sortpuz_lib::run()
}
