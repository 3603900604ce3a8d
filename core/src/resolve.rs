use alloy::{
    network::Network, primitives::Address, providers::Provider,
    signers::local::PrivateKeySigner,
};
use balsnap_common::erc20::IERC20::IERC20Instance;
use balsnap_utils::alloy::StringExt;

/// Anything that can stand for an account or a token contract.
pub trait IntoAddress {
    fn into_address(self) -> crate::Result<Address>;
}

impl IntoAddress for Address {
    fn into_address(self) -> crate::Result<Address> {
        Ok(self)
    }
}

impl IntoAddress for &Address {
    fn into_address(self) -> crate::Result<Address> {
        Ok(*self)
    }
}

impl IntoAddress for &str {
    fn into_address(self) -> crate::Result<Address> {
        Ok(self.parse_as_address()?)
    }
}

impl IntoAddress for String {
    fn into_address(self) -> crate::Result<Address> {
        self.as_str().into_address()
    }
}

impl IntoAddress for &String {
    fn into_address(self) -> crate::Result<Address> {
        self.as_str().into_address()
    }
}

impl IntoAddress for &PrivateKeySigner {
    fn into_address(self) -> crate::Result<Address> {
        Ok(self.address())
    }
}

impl<P: Provider<N>, N: Network> IntoAddress for &IERC20Instance<P, N> {
    fn into_address(self) -> crate::Result<Address> {
        Ok(*self.address())
    }
}
