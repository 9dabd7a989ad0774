use bytes::Bytes;

use riptide::{
    base::ObjType,
    config::EngineConfig,
    memory::MemoryResponse,
    scan::ScanFilter,
    shard::BlockInfo,
    Engine,
};

#[tokio::main]
async fn main() {
    let mut engine = Engine::init(EngineConfig::default()).await;

    // seed every shard with a few keys and allocation shapes
    engine
        .shards()
        .broadcast(|state| {
            let id = state.id() as u64;
            for i in 0..8 {
                state.insert(Bytes::from(format!("user:{id}:{i}")), ObjType::String);
            }
            state.arena_mut().record(BlockInfo {
                block_size: 64,
                reserved: 4096,
                committed: 4096,
                used: 64 * (id + 1),
            });
            state.arena_mut().record(BlockInfo {
                block_size: 256,
                reserved: 8192,
                committed: 8192,
                used: 256,
            });
        })
        .await;

    // scan shard 0 for user keys
    let filter = ScanFilter::try_from_args(&["MATCH".to_string(), "user:*".to_string()]).unwrap();
    let step = engine.shards().run_on(0, move |state| state.scan(&filter)).await;
    println!("shard 0 matched {} keys, cursor {:?}", step.names.len(), step.cursor);

    // merged memory report across all shards
    match engine
        .memory_cmd()
        .run(&["malloc-stats".to_string()])
        .await
        .unwrap()
    {
        MemoryResponse::Text(text) => println!("{text}"),
        MemoryResponse::Integer(value) => println!("{value}"),
    }

    engine.shutdown().await.unwrap();
}
