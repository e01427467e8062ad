use criterion::{black_box, criterion_group, criterion_main, Criterion};
use http1_codec::codec::MessageParser;
use http1_codec::protocol::FieldId;

fn bench_parse_request(c: &mut Criterion) {
    let request = b"GET /index.html HTTP/1.1\r\nHost: 127.0.0.1:8080\r\nUser-Agent: curl/7.79.1\r\nAccept: */*\r\n\r\n";

    c.bench_function("parse_simple_request", |b| {
        b.iter(|| {
            let mut parser = MessageParser::request();
            parser.feed(request);
            black_box(parser.parse_header().unwrap());
        });
    });
}

fn bench_parse_chunked_response(c: &mut Criterion) {
    let response =
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\nWiki\r\n5\r\npedia\r\n0\r\n\r\n";

    c.bench_function("parse_chunked_response", |b| {
        b.iter(|| {
            let mut parser = MessageParser::response();
            parser.feed(response);
            parser.parse_header().unwrap();
            parser.parse_body().unwrap();
            black_box(parser.body());
        });
    });
}

fn bench_field_lookup(c: &mut Criterion) {
    let mut parser = MessageParser::request();
    parser.feed(
        b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: keep-alive\r\nAccept: */*\r\nAccept-Encoding: gzip, deflate, br\r\nAccept-Language: en-US,en;q=0.7\r\n\r\n",
    );
    parser.parse_header().unwrap();
    let fields = parser.detach_fields().unwrap();

    c.bench_function("field_lookup_by_id", |b| {
        b.iter(|| black_box(fields.at(FieldId::AcceptEncoding).unwrap()));
    });

    c.bench_function("field_lookup_by_name", |b| {
        b.iter(|| black_box(fields.at("accept-encoding").unwrap()));
    });
}

criterion_group!(benches, bench_parse_request, bench_parse_chunked_response, bench_field_lookup);
criterion_main!(benches);
