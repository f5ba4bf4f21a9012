#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    donor_receipt_server::run().await
}
