//! Benchmarks for envelope framing and PDU body codecs.
//!
//! Run with: cargo bench --bench codec

use bytes::{Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio_util::codec::{Decoder, Encoder};

use smpp::codec::{Frame, SmppCodec};
use smpp::pdu::{tags, Command, Pdu, Status, SubmitSm, TlvMap};

fn sample_submit(len: usize) -> SubmitSm {
    SubmitSm {
        service_type: "CMT".to_string(),
        source_addr: "40004".to_string(),
        dest_addr: "258841234567".to_string(),
        short_message: vec![0x41; len],
        ..Default::default()
    }
}

fn bench_frame_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/frame_encode");

    for len in [0usize, 160, 1024].iter() {
        let frame = Frame::request(
            Command::SubmitSm,
            7,
            Bytes::from(vec![0x41; *len]),
        );
        group.throughput(Throughput::Bytes(frame.encoded_len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, _| {
            let mut codec = SmppCodec::new();
            let mut buf = BytesMut::with_capacity(4096);
            b.iter(|| {
                buf.clear();
                codec.encode(black_box(frame.clone()), &mut buf).unwrap();
                black_box(buf.len())
            })
        });
    }

    group.finish();
}

fn bench_frame_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/frame_decode");

    for len in [0usize, 160, 1024].iter() {
        let mut codec = SmppCodec::new();
        let mut encoded = BytesMut::new();
        codec
            .encode(
                Frame::response(Command::SubmitSmResp, Status::Ok, 7, Bytes::from(vec![0; *len])),
                &mut encoded,
            )
            .unwrap();
        let encoded = encoded.freeze();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), len, |b, _| {
            b.iter(|| {
                let mut buf = BytesMut::from(&encoded[..]);
                black_box(codec.decode(&mut buf).unwrap())
            })
        });
    }

    group.finish();
}

fn bench_submit_body(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/submit_sm");

    let plain = sample_submit(120);
    group.bench_function("encode_plain", |b| {
        b.iter(|| black_box(Pdu::SubmitSm(plain.clone()).to_body(0x34)))
    });

    let mut tagged = sample_submit(0);
    tagged.tlvs.insert(tags::MESSAGE_PAYLOAD, vec![0x41u8; 512]);
    tagged
        .tlvs
        .insert(tags::USER_MESSAGE_REFERENCE, vec![0x00u8, 0x2A]);
    group.bench_function("encode_with_tlvs", |b| {
        b.iter(|| black_box(Pdu::SubmitSm(tagged.clone()).to_body(0x34)))
    });

    let body = Pdu::SubmitSm(tagged.clone()).to_body(0x34);
    group.bench_function("decode_with_tlvs", |b| {
        b.iter(|| black_box(Pdu::from_body(Command::SubmitSm, body.clone()).unwrap()))
    });

    group.finish();
}

fn bench_tlv_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec/tlv_map");

    group.bench_function("insert_and_get", |b| {
        b.iter(|| {
            let mut map = TlvMap::new();
            map.insert_u8(tags::SC_INTERFACE_VERSION, 0x34);
            map.insert(tags::RECEIPTED_MESSAGE_ID, &b"msg-0001\0"[..]);
            black_box(map.get_u8(tags::SC_INTERFACE_VERSION))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_frame_encode,
    bench_frame_decode,
    bench_submit_body,
    bench_tlv_map,
);

criterion_main!(benches);
