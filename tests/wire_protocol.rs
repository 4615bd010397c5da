use pgrest::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Mutex;

const BASE: &str = "http://localhost:3000";

fn client() -> PostgrestClient {
    PostgrestClient::new(BASE)
        .expect("valid base uri")
        .schema("public")
}

#[test]
fn test_select_with_limit() {
    let req = client()
        .from("users")
        .select_columns("id,name")
        .limit(10)
        .build()
        .expect("complete builder");

    assert_eq!(req.method(), Method::Get);
    assert_eq!(req.uri(), "http://localhost:3000/users?select=id,name&limit=10");
    assert_eq!(
        req.headers(),
        &[("Accept-Profile".to_string(), "public".to_string())]
    );
}

#[test]
fn test_rpc_call() {
    let req = client()
        .from("ignored")
        .rpc("add_user", json!({"name": "Bob"}))
        .build()
        .expect("complete builder");

    assert_eq!(req.method(), Method::Post);
    assert_eq!(req.uri(), "http://localhost:3000/rpc/add_user");
    assert_eq!(req.header("Content-Type"), Some("application/json"));
    assert_eq!(req.header("Content-Profile"), Some("public"));
    assert_eq!(req.header("Accept-Profile"), None);
    assert_eq!(
        req.serialized_body().unwrap().unwrap(),
        br#"{"name":"Bob"}"#.to_vec()
    );
}

#[test]
fn test_client_rpc_then_read_only_override() {
    let req = client()
        .rpc("search")
        .read_only_rpc_where("search", ["q=eq.rust"])
        .build()
        .expect("complete builder");

    assert_eq!(req.method(), Method::Get);
    assert_eq!(req.header("Accept-Profile"), Some("public"));
}

#[test]
fn test_upsert_merge_duplicates() {
    let req = client()
        .from("t")
        .upsert_with(json!([{"id": 1}]), true)
        .build()
        .expect("complete builder");

    assert_eq!(req.method(), Method::Post);
    assert_eq!(req.header("Prefer"), Some("resolution=merge-duplicates"));
}

#[test]
fn test_update_single_result() {
    let req = client()
        .from("t")
        .update(json!({"done": true}))
        .single_result()
        .build()
        .expect("complete builder");

    assert_eq!(req.method(), Method::Patch);
    assert_eq!(req.header("Prefer"), Some("return=representation"));
    assert_eq!(req.header("Accept"), Some("application/vnd.pgrst.object+json"));
}

#[test]
fn test_all_preferences_fold_into_one_header() {
    let req = client()
        .from("t")
        .upsert_with(json!([]), false)
        .prefer("missing=default")
        .return_representation()
        .count(CountPreference::Estimated)
        .build()
        .expect("complete builder");

    let prefer: Vec<&(String, String)> = req
        .headers()
        .iter()
        .filter(|(n, _)| n.eq_ignore_ascii_case("prefer"))
        .collect();
    assert_eq!(prefer.len(), 1);
    assert_eq!(
        prefer[0].1,
        "resolution=ignore-duplicates,missing=default,return=representation,count=estimated"
    );
}

#[test]
fn test_profile_header_comes_first() {
    let req = client()
        .from("t")
        .insert(json!({}))
        .json()
        .prefer("return=minimal")
        .build()
        .expect("complete builder");

    let names: Vec<&str> = req.headers().iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["Content-Profile", "Content-Type", "Prefer"]);
}

#[test]
fn test_typed_filters_mix_with_raw() {
    let req = client()
        .from("people")
        .select()
        .filter(Filter::or([Filter::lt("age", 18), Filter::gt("age", 65)]))
        .raw_param("name=ilike.*bob*")
        .build()
        .expect("complete builder");

    assert_eq!(
        req.uri(),
        "http://localhost:3000/people?or=(age.lt.18,age.gt.65)&name=ilike.*bob*"
    );
}

#[test]
fn test_missing_path_is_reported() {
    let err = QueryBuilder::new(BASE)
        .schema("public")
        .select()
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "Missing mandatory field: path");
}

#[test]
fn test_missing_schema_without_client_default() {
    let err = PostgrestClient::new(BASE)
        .unwrap()
        .from("t")
        .select()
        .build()
        .unwrap_err();
    assert!(matches!(err, PostgrestError::MissingField("schema")));
}

/// Records every request instead of sending it.
#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<PostgrestRequest>>,
}

impl Transport for Recorder {
    async fn send(&self, request: &PostgrestRequest) -> PostgrestResult<RawResponse> {
        self.sent.lock().unwrap().push(request.clone());
        Ok(RawResponse {
            status: 204,
            headers: Vec::new(),
            body: Vec::new(),
        })
    }
}

#[tokio::test]
async fn test_send_builds_then_hands_off() {
    let recorder = Recorder::default();

    let resp = client()
        .from("sessions")
        .delete_where(["expired=is.true"])
        .send(&recorder)
        .await
        .expect("send succeeds");
    assert_eq!(resp.status, 204);

    let sent = recorder.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method(), Method::Delete);
    assert_eq!(sent[0].uri(), "http://localhost:3000/sessions?expired=is.true");
}

#[tokio::test]
async fn test_send_never_reaches_transport_when_incomplete() {
    let recorder = Recorder::default();

    let err = client().from("t").send(&recorder).await.unwrap_err();
    assert!(matches!(err, PostgrestError::MissingField("method")));
    assert!(recorder.sent.lock().unwrap().is_empty());
}
