use lgw_asset::{Asset, AssetCodec};

use crate::state::TxContext;

/// A contract deployed on the development network.
///
/// `invoke` returns the function's result or an error message that is
/// passed back to the client verbatim.
pub trait Chaincode: Send + Sync {
    fn invoke(
        &self,
        ctx: &mut TxContext<'_>,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, String>;
}

/// The basic asset-transfer contract.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssetTransfer;

impl AssetTransfer {
    /// Assets written by `InitLedger`.
    pub fn sample_assets() -> Vec<Asset> {
        vec![
            Asset::new("asset1", "blue", 5, "Tomoko", 300),
            Asset::new("asset2", "red", 5, "Brad", 400),
            Asset::new("asset3", "green", 10, "Jin Soo", 500),
            Asset::new("asset4", "yellow", 10, "Max", 600),
            Asset::new("asset5", "black", 15, "Adriana", 700),
            Asset::new("asset6", "white", 15, "Michel", 800),
        ]
    }

    fn init_ledger(ctx: &mut TxContext<'_>) -> Result<Vec<u8>, String> {
        for asset in Self::sample_assets() {
            Self::put(ctx, &asset)?;
        }
        Ok(Vec::new())
    }

    fn create(ctx: &mut TxContext<'_>, args: &[String]) -> Result<Vec<u8>, String> {
        let asset = parse_asset(args)?;
        if ctx.get_state(&asset.id).is_some() {
            return Err(format!("the asset {} already exists", asset.id));
        }
        Self::put(ctx, &asset)?;
        Ok(Vec::new())
    }

    fn read(ctx: &mut TxContext<'_>, id: &str) -> Result<Asset, String> {
        let bytes = ctx
            .get_state(id)
            .ok_or_else(|| format!("the asset {id} does not exist"))?;
        AssetCodec::decode(&bytes).map_err(|e| format!("failed to read asset {id}: {e}"))
    }

    fn update(ctx: &mut TxContext<'_>, args: &[String]) -> Result<Vec<u8>, String> {
        let asset = parse_asset(args)?;
        if ctx.get_state(&asset.id).is_none() {
            return Err(format!("the asset {} does not exist", asset.id));
        }
        Self::put(ctx, &asset)?;
        Ok(Vec::new())
    }

    fn delete(ctx: &mut TxContext<'_>, id: &str) -> Result<Vec<u8>, String> {
        if ctx.get_state(id).is_none() {
            return Err(format!("the asset {id} does not exist"));
        }
        ctx.del_state(id);
        Ok(Vec::new())
    }

    fn transfer(ctx: &mut TxContext<'_>, id: &str, new_owner: &str) -> Result<Vec<u8>, String> {
        let asset = Self::read(ctx, id)?;
        let previous = asset.owner.clone();
        Self::put(ctx, &asset.with_owner(new_owner))?;
        Ok(previous.into_bytes())
    }

    /// An empty ledger answers with an empty payload.
    fn all(ctx: &mut TxContext<'_>) -> Result<Vec<u8>, String> {
        let assets = ctx
            .all_states()
            .into_iter()
            .map(|(key, bytes)| {
                AssetCodec::decode(&bytes).map_err(|e| format!("failed to read asset {key}: {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if assets.is_empty() {
            return Ok(Vec::new());
        }
        AssetCodec::encode_list(&assets).map_err(|e| e.to_string())
    }

    fn put(ctx: &mut TxContext<'_>, asset: &Asset) -> Result<(), String> {
        let bytes = AssetCodec::encode(asset).map_err(|e| e.to_string())?;
        ctx.put_state(&asset.id, bytes);
        Ok(())
    }
}

impl Chaincode for AssetTransfer {
    fn invoke(
        &self,
        ctx: &mut TxContext<'_>,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, String> {
        match function {
            "InitLedger" => {
                expect_args(args, 0)?;
                Self::init_ledger(ctx)
            }
            "CreateAsset" => Self::create(ctx, args),
            "ReadAsset" => {
                expect_args(args, 1)?;
                let asset = Self::read(ctx, &args[0])?;
                AssetCodec::encode(&asset).map_err(|e| e.to_string())
            }
            "UpdateAsset" => Self::update(ctx, args),
            "DeleteAsset" => {
                expect_args(args, 1)?;
                Self::delete(ctx, &args[0])
            }
            "AssetExists" => {
                expect_args(args, 1)?;
                let exists = ctx.get_state(&args[0]).is_some();
                Ok(exists.to_string().into_bytes())
            }
            "TransferAsset" => {
                expect_args(args, 2)?;
                Self::transfer(ctx, &args[0], &args[1])
            }
            "GetAllAssets" => {
                expect_args(args, 0)?;
                Self::all(ctx)
            }
            other => Err(format!(
                "function {other} not found in contract AssetTransfer"
            )),
        }
    }
}

fn expect_args(args: &[String], n: usize) -> Result<(), String> {
    if args.len() != n {
        return Err(format!(
            "incorrect number of arguments: expected {n}, got {}",
            args.len()
        ));
    }
    Ok(())
}

/// `id, color, size, owner, appraisedValue`.
fn parse_asset(args: &[String]) -> Result<Asset, String> {
    expect_args(args, 5)?;
    let size = args[2]
        .parse::<i64>()
        .map_err(|_| format!("size must be an integer, got {:?}", args[2]))?;
    let value = args[4]
        .parse::<i64>()
        .map_err(|_| format!("appraised value must be an integer, got {:?}", args[4]))?;
    Ok(Asset::new(&args[0], &args[1], size, &args[3], value))
}
