use std::sync::Arc;

use cfgtree_client::RemoteClient;
use cfgtree_core::{AttrFlags, AttrType, Range, Tree, Value};
use cfgtree_rcp::RcpServer;
use tokio::net::TcpListener;

#[tokio::test]
async fn get_put_round_trip_over_the_network() {
    let tree = Arc::new(Tree::new());
    let m = tree.get_node("/m/").unwrap();
    m.create_attribute("n", AttrType::Int, Value::Int(1), Range::Int { min: 0, max: 10 }, AttrFlags::NORMAL, "")
        .unwrap();

    let server = RcpServer::new(tree.clone(), 16);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    let mut client = RemoteClient::connect(addr).await.unwrap();
    assert!(client.node_exists("/m/").await.unwrap());
    assert!(!client.node_exists("/missing/").await.unwrap());

    client.put("/m/", "n", AttrType::Int, "9").await.unwrap();
    assert_eq!(client.get("/m/", "n", AttrType::Int).await.unwrap(), "9");
    assert_eq!(m.get_attribute("n", AttrType::Int).unwrap(), Value::Int(9));
}

#[tokio::test]
async fn out_of_range_put_surfaces_as_an_error() {
    let tree = Arc::new(Tree::new());
    let m = tree.get_node("/m/").unwrap();
    m.create_attribute("n", AttrType::Int, Value::Int(1), Range::Int { min: 0, max: 10 }, AttrFlags::NORMAL, "")
        .unwrap();

    let server = RcpServer::new(tree.clone(), 16);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    let mut client = RemoteClient::connect(addr).await.unwrap();
    assert!(client.put("/m/", "n", AttrType::Int, "999").await.is_err());
    assert_eq!(m.get_attribute("n", AttrType::Int).unwrap(), Value::Int(1));
}

#[tokio::test]
async fn push_subscriber_observes_remote_puts() {
    let tree = Arc::new(Tree::new());
    let m = tree.get_node("/m/").unwrap();
    m.create_attribute("b", AttrType::Bool, Value::Bool(false), Range::None, AttrFlags::NORMAL, "").unwrap();

    let server = RcpServer::new(tree.clone(), 16);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    let mut subscriber = RemoteClient::connect(addr).await.unwrap();
    subscriber.add_push_client().await.unwrap();

    let mut writer = RemoteClient::connect(addr).await.unwrap();
    writer.put("/m/", "b", AttrType::Bool, "true").await.unwrap();

    let push = subscriber.next_push().await.unwrap().unwrap();
    assert_eq!(push.node, "/m/");
    assert_eq!(push.key, "b");
    assert_eq!(push.value, "true");
}

#[tokio::test]
async fn dump_tree_collects_schema_up_to_the_terminator() {
    let tree = Arc::new(Tree::new());
    let m = tree.get_node("/m/").unwrap();
    m.create_attribute("n", AttrType::Int, Value::Int(1), Range::unbounded(AttrType::Int), AttrFlags::NORMAL, "")
        .unwrap();

    let server = RcpServer::new(tree.clone(), 16);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));

    let mut client = RemoteClient::connect(addr).await.unwrap();
    let frames = client.dump_tree("/m/").await.unwrap();
    assert!(frames.iter().any(|f| f.node == "/m/" && f.key.is_empty()));
    assert!(frames.iter().any(|f| f.key == "n"));
}
