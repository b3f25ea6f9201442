//! Integration tests for the CSV reports using wiremock and temp directories

use hcctl::hypercore::{Clock, ClientConfig, HyperCoreClient, Session};
use hcctl::report::inventory::{NODE_OVERVIEW_FILE, VM_OVERVIEW_FILE};
use hcctl::report::perf::{NODE_PERF_FILE, VM_PERF_FILE};
use hcctl::report::{record_performance, write_inventory};
use serde_json::json;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct FakeClock(Mutex<Instant>);

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        *self.0.lock().unwrap() += duration;
        std::future::ready(())
    }
}

async fn mock_cluster() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/VirDomain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "uuid": "u-1", "name": "web", "state": "RUNNING", "numVCPU": 2,
                "mem": 2147483648u64, "machineType": "scale-7.2", "nodeUUID": "n-1",
                "sourceVirDomainUUID": "", "snapUUIDs": ["s-1", "s-2"],
                "blockDevs": [
                    {"uuid": "d-1", "type": "VIRTIO_DISK", "capacity": 20000000000u64, "allocation": 5000000000u64}
                ]
            },
            {"uuid": "u-2", "name": "old", "state": "PAUSED"}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/Node"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "uuid": "n-1", "lanIP": "10.0.0.1", "backplaneIP": "10.1.0.1",
                "capacity": 4000000000000u64, "memSize": 68719476736u64,
                "totalMemUsageBytes": 17179869184u64, "memUsagePercentage": 25.0,
                "cpuUsage": 10.0, "CPUhz": 2000000000u64,
                "numSockets": 2, "numCores": 16, "numThreads": 32, "drives": []
            }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/VirDomainStats/u-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"uuid": "u-1", "cpuUsage": 25.0, "rxBitRate": 8.0, "txBitRate": 4.0, "vsdStats": []}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/VirDomainStats/u-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"uuid": "u-2", "cpuUsage": 0.0, "rxBitRate": 0.0, "txBitRate": 0.0}
        ])))
        .mount(&server)
        .await;

    server
}

#[tokio::test]
async fn test_inventory_files() {
    let server = mock_cluster().await;
    let client = HyperCoreClient::new(ClientConfig::new(&server.uri())).unwrap();
    let dir = tempfile::tempdir().unwrap();

    write_inventory(&client, &Session::new("s"), dir.path())
        .await
        .unwrap();

    let vms = std::fs::read_to_string(dir.path().join(VM_OVERVIEW_FILE)).unwrap();
    let lines: Vec<&str> = vms.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[1],
        "web,RUNNING,2,2,2,scale-7.2,LOCAL,VIRTIO_DISK,20,25,NO_DISK,0,0"
    );

    let nodes = std::fs::read_to_string(dir.path().join(NODE_OVERVIEW_FILE)).unwrap();
    assert_eq!(
        nodes.lines().nth(1).unwrap(),
        "10.0.0.1,10.1.0.1,4000,64,16,2,2,16,32,0"
    );
}

#[tokio::test]
async fn test_one_performance_sample() {
    let server = mock_cluster().await;
    let client = HyperCoreClient::new(ClientConfig::new(&server.uri())).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock(Mutex::new(Instant::now()));

    let samples = record_performance(
        &client,
        &Session::new("s"),
        dir.path(),
        Duration::from_secs(10),
        Duration::from_secs(10),
        &clock,
    )
    .await
    .unwrap();
    assert_eq!(samples, 1);

    let vm_perf = std::fs::read_to_string(dir.path().join(VM_PERF_FILE)).unwrap();
    assert_eq!(vm_perf.lines().count(), 3);
    let web = vm_perf.lines().nth(1).unwrap();
    assert!(web.contains(",web,2,25,2,0.5,8,4,VIRTIO_DISK,,,,,NO_DISK,0,0,0,0"), "{}", web);

    let node_perf = std::fs::read_to_string(dir.path().join(NODE_PERF_FILE)).unwrap();
    assert_eq!(node_perf.lines().nth(1).unwrap(), "10.0.0.1,64,16,25,10");
}
