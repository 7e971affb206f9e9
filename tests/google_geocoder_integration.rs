use reqwest::{Client, Url};
use restaurant_map::geocoding::google::GoogleGeocoder;
use restaurant_map::geocoding::DEFAULT_REGION;
use restaurant_map::{AddressQuery, Coordinate, GeocodeStatus, Geocoder, MapConfig, MapError};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;


use map_test_utils::shared::init_logging;

// Serves exactly one HTTP response and hands back the raw request head.
async fn serve_once(status_line: &'static str, body: String) -> (Url, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub geocoder");
    let addr = listener.local_addr().unwrap();

    let task = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("No request arrived");
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&request).into_owned()
    });

    let endpoint = Url::parse(&format!("http://{}/maps/api/geocode/json", addr)).unwrap();
    (endpoint, task)
}

fn stub_geocoder(endpoint: Url, api_key: Option<&str>) -> GoogleGeocoder {
    init_logging();
    let http_client = Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build HTTP client");
    GoogleGeocoder::with_client(endpoint, api_key, http_client)
}

fn request_query(request_head: &str) -> Vec<(String, String)> {
    let target = request_head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .expect("Malformed request line");
    Url::parse(&format!("http://stub{}", target))
        .unwrap()
        .query_pairs()
        .into_owned()
        .collect()
}

#[cfg(test)]
mod google_geocoder_tests {
    use super::*;

    #[tokio::test]
    async fn test_geocode_ok_response() {
        let body = json!({
            "status": "OK",
            "results": [{
                "formatted_address": "日本、〒150-0000 東京都渋谷区",
                "geometry": {"location": {"lat": 35.6595, "lng": 139.7005}}
            }]
        })
        .to_string();
        let (endpoint, server) = serve_once("200 OK", body).await;
        let geocoder = stub_geocoder(endpoint, Some("test-key"));

        let response = geocoder
            .geocode(AddressQuery::new("東京都渋谷区", DEFAULT_REGION))
            .await
            .expect("Geocode request failed");

        assert_eq!(response.status, GeocodeStatus::Ok);
        assert_eq!(
            response.first_location(),
            Some(Coordinate::new(35.6595, 139.7005).unwrap())
        );

        let request_head = server.await.unwrap();
        assert!(request_head.starts_with("GET /maps/api/geocode/json?"));
        assert_eq!(
            request_query(&request_head),
            vec![
                ("address".to_string(), "東京都渋谷区".to_string()),
                ("region".to_string(), "jp".to_string()),
                ("key".to_string(), "test-key".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_results_is_data_not_error() {
        let body = json!({"status": "ZERO_RESULTS", "results": []}).to_string();
        let (endpoint, server) = serve_once("200 OK", body).await;
        let geocoder = stub_geocoder(endpoint, None);

        let response = geocoder
            .geocode(AddressQuery::new("", DEFAULT_REGION))
            .await
            .expect("ZERO_RESULTS should not be an error");

        assert_eq!(response.status, GeocodeStatus::ZeroResults);
        assert!(response.first_location().is_none());
        let query = request_query(&server.await.unwrap());
        assert!(query.iter().all(|(k, _)| k != "key"));
    }

    #[tokio::test]
    async fn test_http_error_maps_to_map_error() {
        let body = json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })
        .to_string();
        let (endpoint, server) = serve_once("403 Forbidden", body).await;
        let geocoder = stub_geocoder(endpoint, Some("bad-key"));

        let result = geocoder
            .geocode(AddressQuery::new("東京都渋谷区", DEFAULT_REGION))
            .await;

        assert!(
            matches!(result, Err(MapError::RequestDenied(ref m)) if m.contains("API key")),
            "Unexpected result: {:?}",
            result
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_non_json_server_error() {
        let (endpoint, server) =
            serve_once("502 Bad Gateway", "<html>upstream down</html>".to_string()).await;
        let geocoder = stub_geocoder(endpoint, None);

        let result = geocoder
            .geocode(AddressQuery::new("東京都渋谷区", DEFAULT_REGION))
            .await;

        assert!(matches!(result, Err(MapError::InternalServerError(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_garbled_success_body() {
        let (endpoint, server) = serve_once("200 OK", "not json".to_string()).await;
        let geocoder = stub_geocoder(endpoint, None);

        let result = geocoder
            .geocode(AddressQuery::new("東京都渋谷区", DEFAULT_REGION))
            .await;

        assert!(matches!(result, Err(MapError::JsonDeserializationFailed(_))));
        server.await.unwrap();
    }

    // Needs GOOGLE_MAPS_API_KEY (a .env file works) and network access.
    #[tokio::test]
    #[ignore]
    async fn test_live_geocode() {
        dotenvy::dotenv().ok();
        init_logging();
        let config = MapConfig::from_env().expect("Invalid map configuration");
        assert!(config.api_key.is_some(), "GOOGLE_MAPS_API_KEY not set");
        let geocoder = GoogleGeocoder::from_config(&config).expect("Failed to build geocoder");

        let response = geocoder
            .geocode(AddressQuery::new("東京都渋谷区", &config.region))
            .await
            .expect("Live geocode failed");

        let location = response.first_location().expect("No location returned");
        assert!((location.latitude() - 35.66).abs() < 0.1);
        assert!((location.longitude() - 139.70).abs() < 0.1);
    }
}
