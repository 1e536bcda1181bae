use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use pprof::criterion::{Output, PProfProfiler};
use url_rewrite::{Engine, RequestContext, Rewrite};

fn profiled() -> Criterion {
    let output = Output::Flamegraph(None);
    let prof = PProfProfiler::new(1000, output);
    Criterion::default().with_profiler(prof)
}

const IIS_RULES: &str = r#"
<rewrite>
  <rules>
    <rule name="www">
      <match url="^/static/(.*)" />
      <conditions logicalGrouping="MatchAny">
        <add input="{HTTP_HOST}" pattern="^www\." />
        <add input="{HTTPS}" pattern="^on$" />
      </conditions>
      <action type="Rewrite" url="/files/{R:1}" />
    </rule>
  </rules>
</rewrite>
"#;

pub fn rewrite_apache(e: &Engine) {
    assert_eq!(
        e.rewrite("/static/hello/world"),
        Rewrite::Uri("/files/hello/world".to_owned())
    )
}

pub fn rewrite_apache_escaped(e: &Engine) {
    assert_eq!(
        e.rewrite("/static/hello/world"),
        Rewrite::Uri("/files/hello%2Fworld".to_owned())
    )
}

pub fn rewrite_iis(e: &Engine) {
    let mut ctx = RequestContext::new("/static/hello/world").host("www.example.com");
    assert_eq!(
        e.rewrite_ctx(&mut ctx),
        Rewrite::Uri("/files/hello/world".to_owned())
    )
}

pub fn bench_apache_match(c: &mut Criterion) {
    let mut e = Engine::default();
    e.add_apache_rules("RewriteRule ^/static/(.*) /files/$1").unwrap();
    c.bench_function("apache_match", |b| {
        b.iter(|| black_box(rewrite_apache(black_box(&e))))
    });
}

pub fn bench_apache_match_escaped(c: &mut Criterion) {
    let mut e = Engine::default();
    e.add_apache_rules("RewriteRule ^/static/(.*) /files/$1 [B]").unwrap();
    c.bench_function("apache_match_escaped", |b| {
        b.iter(|| black_box(rewrite_apache_escaped(black_box(&e))))
    });
}

pub fn bench_iis_conditions(c: &mut Criterion) {
    let mut e = Engine::default();
    e.add_iis_rules(IIS_RULES).unwrap();
    c.bench_function("iis_conditions", |b| {
        b.iter(|| black_box(rewrite_iis(black_box(&e))))
    });
}

criterion_group!(
    name = benches;
    config = profiled();
    targets = bench_apache_match, bench_apache_match_escaped, bench_iis_conditions
);
criterion_main!(benches);
