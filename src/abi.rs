//! Contract interfaces spoken inside the execution host.
//!
//! Every call between contracts (tokens, venues, the arbitrage executor) is an
//! ABI-encoded `alloy` call built from these definitions, so payloads are byte
//! compatible with what the Solidity side would produce with `abi.encode`.

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function totalSupply() external view returns (uint256);

        function balanceOf(address account) external view returns (uint256);

        function allowance(address owner, address spender) external view returns (uint256);

        function transfer(address to, uint256 amount) external returns (bool);

        function approve(address spender, uint256 amount) external returns (bool);

        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IERC4626 {
        function asset() external view returns (address);

        function totalAssets() external view returns (uint256);

        function convertToShares(uint256 assets) external view returns (uint256);

        function convertToAssets(uint256 shares) external view returns (uint256);

        function deposit(uint256 assets, address receiver) external returns (uint256);

        function redeem(uint256 shares, address receiver, address owner) external returns (uint256);
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IUniswapV3Pool {
        function token0() external view returns (address);

        function token1() external view returns (address);

        function fee() external view returns (uint24);

        function swap(
            address recipient,
            bool zeroForOne,
            int256 amountSpecified,
            uint160 sqrtPriceLimitX96,
            bytes data
        ) external returns (int256, int256);
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IUniswapV3SwapCallback {
        function uniswapV3SwapCallback(int256 amount0Delta, int256 amount1Delta, bytes data) external;
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IBalancerVault {
        struct SingleSwap {
            bytes32 poolId;
            uint8 kind;
            address assetIn;
            address assetOut;
            uint256 amount;
            bytes userData;
        }

        struct FundManagement {
            address sender;
            bool fromInternalBalance;
            address recipient;
            bool toInternalBalance;
        }

        function swap(
            SingleSwap singleSwap,
            FundManagement funds,
            uint256 limit,
            uint256 deadline
        ) external returns (uint256);

        function flashLoan(
            address recipient,
            address[] tokens,
            uint256[] amounts,
            bytes userData
        ) external;
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IFlashLoanRecipient {
        function receiveFlashLoan(
            address[] tokens,
            uint256[] amounts,
            uint256[] feeAmounts,
            bytes userData
        ) external;
    }
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface ICurvePool {
        function coins(uint256 index) external view returns (address);

        function get_dy(uint256 i, uint256 j, uint256 dx) external view returns (uint256);

        function exchange(uint256 i, uint256 j, uint256 dx, uint256 min_dy) external;
    }
}

sol! {
    /// Entry points of the arbitrage executor.
    #[derive(Debug, PartialEq, Eq)]
    interface ILstArbitrage {
        function runVaultArbitrage(
            address lst,
            address baseAsset,
            uint256 amountIn,
            bytes sellPayload
        ) external returns (uint256);

        function runFlashSwapArbitrage(
            address pool,
            bool zeroForOne,
            uint256 amountIn
        ) external returns (uint256);

        function depositIntoLst(address lst, address baseAsset, uint256 amount) external returns (uint256);

        function sellOrderedPool(address pool, bool zeroForOne, uint256 amountIn) external;

        function sellVaultPool(bytes32 poolId, address tokenIn, address tokenOut, uint256 amountIn) external;

        function sellIndexedPool(address pool, uint256 indexIn, uint256 indexOut, uint256 amountIn) external;

        function receiveFlashLoan(
            address[] tokens,
            uint256[] amounts,
            uint256[] feeAmounts,
            bytes userData
        ) external;

        function uniswapV3SwapCallback(int256 amount0Delta, int256 amount1Delta, bytes data) external;
    }
}
