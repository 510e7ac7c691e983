fn main() -> anyhow::Result<()> {
    globe_scene::run(globe_scene::SceneConfig::default())
}
