#[tokio::main]
async fn main() {
    rehearsal_backend::run().await
}
