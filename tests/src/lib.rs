#[cfg(test)]
mod install_flow;
#[cfg(test)]
mod provision_flow;
#[cfg(test)]
mod uninstall_flow;
