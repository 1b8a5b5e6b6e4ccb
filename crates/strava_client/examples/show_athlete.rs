use strava_client::{
    CallContext, StravaClient, config::Config, http_client::ReqwestStravaClient,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example: expects STRAVA_ACCESS_TOKEN in env
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(());
        }
    };
    let client = ReqwestStravaClient::from_config(&cfg, false)?;
    let athlete = client.get_athlete(&CallContext::background()).await?;
    println!(
        "Athlete: {} {} ({}) from {}",
        athlete.first_name, athlete.last_name, athlete.id, athlete.city
    );
    Ok(())
}
