use tonic::{Request, Status};

use crate::context::{RequestId, X_REQUEST_ID};

/// Propagate `x-request-id` metadata (or assign one) into the request
/// extensions, where the service picks it up.
pub fn request_id(mut request: Request<()>) -> Result<Request<()>, Status> {
    let id = RequestId::from_header(request.metadata().get(X_REQUEST_ID).and_then(|v| v.to_str().ok()));
    request.extensions_mut().insert(id);
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_incoming_id() {
        let mut request = Request::new(());
        request.metadata_mut().insert(X_REQUEST_ID, "req-42".parse().unwrap());

        let request = request_id(request).unwrap();
        assert_eq!(request.extensions().get::<RequestId>().unwrap().0, "req-42");
    }

    #[test]
    fn assigns_id_when_missing() {
        let request = request_id(Request::new(())).unwrap();
        assert!(!request.extensions().get::<RequestId>().unwrap().0.is_empty());
    }
}
