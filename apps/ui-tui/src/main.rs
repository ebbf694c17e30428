mod app;
mod keymap;
mod screens;
mod theme;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::run().await
}
