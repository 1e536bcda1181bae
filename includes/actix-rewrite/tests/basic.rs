use std::collections::HashMap;

use actix_http::header::{self, HeaderValue};
use actix_rewrite::{Engine, RewriteMap, RewriteMaps};
use actix_web::{
    HttpRequest, HttpResponse, Responder, body, get,
    test::{self, TestRequest},
    web,
};
use serde::{Deserialize, Serialize};

type QueryMap = web::Query<HashMap<String, String>>;

#[derive(Debug, Serialize, Deserialize)]
struct Response {
    path: String,
    query: HashMap<String, String>,
}

#[get("/index.php")]
async fn index(req: HttpRequest, query: QueryMap) -> impl Responder {
    HttpResponse::Ok().json(Response {
        path: req.path().to_string(),
        query: query.into_inner(),
    })
}

#[actix_web::test]
async fn apache_rewrite() {
    let mut engine = Engine::new();
    engine
        .add_apache_rules(
            r#"
        RewriteRule ^/redirect/(.*) /new/$1            [R]
        RewriteRule ^/one/([\w/]*)  /index.php?page=$1 [QSA,L]
        RewriteRule ^/blocked/      -                  [F]
    "#,
        )
        .expect("failed to load rules");

    let srv = test::init_service(
        actix_web::App::new()
            .wrap(engine.middleware())
            .service(index),
    )
    .await;

    let req = TestRequest::with_uri("/redirect/hello/world").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().to_string(), "302 Found");
    assert_eq!(
        res.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static("/new/hello/world"))
    );

    let req = TestRequest::with_uri("/blocked/page").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 403);

    let req = TestRequest::with_uri("/one/1/2/3?a=b").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().to_string(), "200 OK");

    let data = body::to_bytes(res.into_body()).await.unwrap();
    let json: Response = serde_json::from_slice(&data).unwrap();
    assert_eq!(json.path, "/index.php");
    assert_eq!(json.query.len(), 2);
    assert_eq!(json.query.get("a"), Some(&"b".to_string()));
    assert_eq!(json.query.get("page"), Some(&"1/2/3".to_string()));
}

#[actix_web::test]
async fn iis_rewrite() {
    let maps: RewriteMaps = [RewriteMap::new("Pages").entry("/home", "welcome")]
        .into_iter()
        .collect();
    let engine = Engine::new()
        .rewrite_maps(maps)
        .iis_rules(
            r#"
        <rewrite>
          <rules>
            <rule name="mapped" stopProcessing="true">
              <match url="^/home$" />
              <action type="Rewrite" url="index.php?page={Pages:{R:0}}" />
            </rule>
            <rule name="maintenance">
              <match url="^/admin" />
              <conditions>
                <add input="{REQUEST_METHOD}" pattern="^POST$" />
              </conditions>
              <action type="CustomResponse" statusCode="503" statusReason="Maintenance" />
            </rule>
            <rule name="moved">
              <match url="^/old/(.*)" />
              <action type="Redirect" url="/new/{R:1}" redirectType="Temporary" />
            </rule>
          </rules>
        </rewrite>
    "#,
        )
        .expect("failed to load rules");
    assert_eq!(engine.len(), 3);

    let srv = test::init_service(
        actix_web::App::new()
            .wrap(engine.middleware())
            .service(index),
    )
    .await;

    let req = TestRequest::with_uri("/home?x=1").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 200);
    let data = body::to_bytes(res.into_body()).await.unwrap();
    let json: Response = serde_json::from_slice(&data).unwrap();
    assert_eq!(json.path, "/index.php");
    assert_eq!(json.query.get("page"), Some(&"welcome".to_string()));
    assert_eq!(json.query.get("x"), Some(&"1".to_string()));

    let req = TestRequest::post().uri("/admin/users").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 503);
    let data = body::to_bytes(res.into_body()).await.unwrap();
    assert_eq!(&data[..], b"Maintenance");

    let req = TestRequest::get().uri("/admin/users").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 404);

    let req = TestRequest::with_uri("/old/a?b=c").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 307);
    assert_eq!(
        res.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static("/new/a?b=c"))
    );
}

#[actix_web::test]
async fn file_tests_use_document_root() {
    let engine = Engine::new()
        .document_root(env!("CARGO_MANIFEST_DIR"))
        .apache_rules(
            r#"
        RewriteCond %{REQUEST_FILENAME} !-f
        RewriteRule ^/(.*)$ /index.php?page=$1 [L]
    "#,
        )
        .expect("failed to load rules");

    let srv = test::init_service(
        actix_web::App::new()
            .wrap(engine.middleware())
            .service(index),
    )
    .await;

    let req = TestRequest::with_uri("/missing").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 200);
    let data = body::to_bytes(res.into_body()).await.unwrap();
    let json: Response = serde_json::from_slice(&data).unwrap();
    assert_eq!(json.query.get("page"), Some(&"missing".to_string()));

    // the file exists so the request falls through unchanged
    let req = TestRequest::with_uri("/Cargo.toml").to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 404);
}

#[actix_web::test]
async fn code_rules() {
    let mut engine = Engine::new();
    engine
        .add_redirect_to_https(302)
        .and_then(|e| e.add_rewrite(r"/(.*)/(\d+)", "/index.php?page=$1&id=$2", true))
        .and_then(|e| e.add_redirect("^/legacy/(.*)", "/new/$1", 301))
        .expect("failed to add rules");
    assert_eq!(engine.len(), 3);
    assert!(matches!(
        engine.add_redirect("^/a", "/b", 200),
        Err(actix_rewrite::Error::BuildError(_))
    ));

    let srv = test::init_service(
        actix_web::App::new()
            .wrap(engine.middleware())
            .service(index),
    )
    .await;

    let req = TestRequest::with_uri("/legacy/page?a=b")
        .insert_header((header::HOST, "example.com"))
        .to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 302);
    assert_eq!(
        res.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static("https://example.com/legacy/page?a=b"))
    );

    let req = TestRequest::with_uri("/widgets/42?x=1")
        .insert_header(("x-forwarded-proto", "https"))
        .to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 200);
    let data = body::to_bytes(res.into_body()).await.unwrap();
    let json: Response = serde_json::from_slice(&data).unwrap();
    assert_eq!(json.path, "/index.php");
    assert_eq!(json.query.get("page"), Some(&"widgets".to_string()));
    assert_eq!(json.query.get("id"), Some(&"42".to_string()));
    assert_eq!(json.query.get("x"), Some(&"1".to_string()));

    let req = TestRequest::with_uri("/legacy/page")
        .insert_header(("x-forwarded-proto", "https"))
        .to_request();
    let res = test::call_service(&srv, req).await;
    assert_eq!(res.status().as_u16(), 301);
    assert_eq!(
        res.headers().get(header::LOCATION),
        Some(&HeaderValue::from_static("/new/page"))
    );
}
