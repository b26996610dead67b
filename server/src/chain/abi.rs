//! Solidity bindings for the parts of `FlightSuretyApp` this server touches
//!
//! Every event parameter is non-indexed, so decoded events carry only the
//! signature topic and everything else lives in the log data.

use alloy_sol_types::sol;

sol! {
    interface IFlightSuretyApp {
        event OracleRequest(uint8 index, address airline, string flight, uint256 timestamp);
        event FlightRegistered(address airline, string flight, bytes32 flightKey, uint256 timestamp);
        event InsurancePurchased(address passenger, bytes32 flightKey, uint256 amount);

        function isOperational() external view returns (bool operational);
        function fetchFlightStatus(address airline, string flight, uint256 timestamp) external;
        function fundAirline() external payable;
        function registerFlights(string flight, uint256 timestamp) external;
        function buyInsurance(bytes32 flightKey) external payable;
        function payPassenger() external;
        function registerAirline(address airline) external;
        function isAirline(address airline) external view returns (bool registered);
        function isAirlineFunded(address airline) external view returns (bool funded);

        function REGISTRATION_FEE() external view returns (uint256 fee);
        function registerOracle() external payable;
        function getMyIndexes() external view returns (uint8[3] indexes);
        function submitOracleResponse(uint8 index, address airline, string flight, uint256 timestamp, uint8 statusCode) external;
    }
}

pub use IFlightSuretyApp::*;
